pub use super::*;

impl<AB: AutodiffBackend> Gaussian2dBasisTrainer<AB> {
    /// Updating the trainable parameters by consuming their gradients.
    ///
    /// The frozen parameters have no gradients, so they are skipped.
    pub fn optimize(
        &mut self,
        mut grads: AB::Gradients,
    ) -> &mut Self {
        let learning_rate = *self.learning_rate;
        let scene = &mut self.scene;

        if let Some(grad) = scene.cholesky.val().grad_remove(&mut grads) {
            let value =
                self.optimizer_cholesky
                    .update(learning_rate, scene.cholesky.val(), grad);
            scene.set_inner_cholesky(value);
        }
        if let Some(grad) = scene.colors.val().grad_remove(&mut grads) {
            let value = self
                .optimizer_colors
                .update(learning_rate, scene.colors.val(), grad);
            scene.set_inner_colors(value);
        }
        if let Some(grad) = scene.features.val().grad_remove(&mut grads) {
            let value =
                self.optimizer_features
                    .update(learning_rate, scene.features.val(), grad);
            scene.set_inner_features(value);
        }
        if let Some(grad) = scene.positions.val().grad_remove(&mut grads) {
            let value =
                self.optimizer_positions
                    .update(learning_rate, scene.positions.val(), grad);
            scene.set_inner_positions(value);
        }

        self
    }
}

//! Parameter tensor with gradient storage

use ndarray::Array1;

/// A flat parameter tensor with an attached gradient slot.
///
/// Models compute their own gradients analytically and accumulate them here;
/// the optimizer reads and clears the slot.
#[derive(Debug, Clone)]
pub struct Param {
    data: Array1<f32>,
    grad: Option<Array1<f32>>,
}

impl Param {
    /// Create a new parameter with data
    pub fn new(data: Array1<f32>) -> Self {
        Self { data, grad: None }
    }

    /// Create a parameter from a vector
    pub fn from_vec(data: Vec<f32>) -> Self {
        Self::new(Array1::from(data))
    }

    /// Create a parameter filled with zeros
    pub fn zeros(size: usize) -> Self {
        Self::new(Array1::zeros(size))
    }

    /// Get reference to data
    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    /// Get mutable reference to data
    pub fn data_mut(&mut self) -> &mut Array1<f32> {
        &mut self.data
    }

    /// Get gradient (if accumulated)
    pub fn grad(&self) -> Option<&Array1<f32>> {
        self.grad.as_ref()
    }

    /// Accumulate gradient (sums when the parameter already has one)
    pub fn accumulate_grad(&mut self, grad: Array1<f32>) {
        match self.grad.as_mut() {
            Some(existing) => *existing = &*existing + &grad,
            None => self.grad = Some(grad),
        }
    }

    /// Zero out gradient
    pub fn zero_grad(&mut self) {
        self.grad = None;
    }

    /// Get size
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accumulate_sums() {
        let mut p = Param::from_vec(vec![1.0, 2.0]);
        p.accumulate_grad(array![0.5, 0.5]);
        p.accumulate_grad(array![1.0, -0.5]);
        assert_eq!(p.grad().unwrap(), &array![1.5, 0.0]);
    }

    #[test]
    fn test_zero_grad_clears() {
        let mut p = Param::zeros(3);
        p.accumulate_grad(Array1::ones(3));
        p.zero_grad();
        assert!(p.grad().is_none());
    }
}

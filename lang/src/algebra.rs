//! Fixed-size vectors and row-major matrices together with the linear algebra
//! used by the runtime.
//!
//! Shape checks return `None`; callers translate that into
//! [`DimensionMismatch`](crate::ErrorKind::DimensionMismatch) errors with the
//! operator context attached. Element arithmetic uses the plain `ops` impls of
//! the element type.

use core::{
    fmt,
    ops::{Add, Div, Mul, Neg, Sub},
};

use num_traits::Zero;

/// Element of a [`Vector`] or [`Matrix`]: `i64` or `f64` in practice.
pub trait Element:
    Copy
    + PartialEq
    + fmt::Debug
    + Zero
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
}

impl<T> Element for T where
    T: Copy
        + PartialEq
        + fmt::Debug
        + Zero
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<Output = T>
        + Neg<Output = T>
{
}

/// Mathematical vector with a fixed number of dimensions.
///
/// The dimension count is set at construction and never changes; arithmetic
/// between vectors of unequal dimensions is rejected rather than truncated
/// or broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T> {
    elements: Vec<T>,
}

impl<T: Element> Vector<T> {
    /// Creates a vector from its elements.
    pub fn new(elements: Vec<T>) -> Self {
        Self { elements }
    }

    /// Returns the number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.elements.len()
    }

    /// Returns the elements in order.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Applies `map` to every element, possibly changing the element type.
    pub fn map<U: Element>(&self, map: impl Fn(T) -> U) -> Vector<U> {
        Vector::new(self.elements.iter().copied().map(map).collect())
    }

    /// Adds two vectors elementwise. Returns `None` on a dimension mismatch.
    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        self.zip_with(rhs, |x, y| x + y)
    }

    /// Subtracts `rhs` elementwise. Returns `None` on a dimension mismatch.
    pub fn checked_sub(&self, rhs: &Self) -> Option<Self> {
        self.zip_with(rhs, |x, y| x - y)
    }

    /// Negates every element.
    pub fn negate(&self) -> Self {
        self.map(|x| -x)
    }

    /// Multiplies every element by `scalar`.
    pub fn scale(&self, scalar: T) -> Self {
        self.map(|x| x * scalar)
    }

    /// Divides every element by `scalar`. The caller is responsible for
    /// rejecting a zero divisor where the element type requires it.
    pub fn scale_div(&self, scalar: T) -> Self
    where
        T: Div<Output = T>,
    {
        self.map(|x| x / scalar)
    }

    /// Computes the dot product (sum of elementwise products).
    /// Returns `None` on a dimension mismatch.
    pub fn dot(&self, rhs: &Self) -> Option<T> {
        if self.dimensions() != rhs.dimensions() {
            return None;
        }
        let product = self
            .elements
            .iter()
            .zip(&rhs.elements)
            .fold(T::zero(), |acc, (&x, &y)| acc + x * y);
        Some(product)
    }

    /// Computes the cross product. Both operands must be exactly 3-dimensional;
    /// any other shape returns `None`.
    pub fn cross(&self, rhs: &Self) -> Option<Self> {
        if self.dimensions() != 3 || rhs.dimensions() != 3 {
            return None;
        }
        let a = &self.elements;
        let b = &rhs.elements;
        Some(Self::new(vec![
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]))
    }

    fn zip_with(&self, rhs: &Self, op: impl Fn(T, T) -> T) -> Option<Self> {
        if self.dimensions() != rhs.dimensions() {
            return None;
        }
        let elements = self
            .elements
            .iter()
            .zip(&rhs.elements)
            .map(|(&x, &y)| op(x, y))
            .collect();
        Some(Self::new(elements))
    }
}

/// Row-major matrix with fixed `rows x cols` shape.
///
/// Equality requires equal shape *and* equal elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    elements: Vec<T>,
}

impl<T: Element> Matrix<T> {
    /// Creates a matrix from a row-major element buffer. Returns `None` unless
    /// exactly `rows * cols` elements are supplied.
    pub fn new(rows: usize, cols: usize, elements: Vec<T>) -> Option<Self> {
        if elements.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, elements })
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the row-major element buffer.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Returns the element at (`row`, `col`).
    pub fn get(&self, row: usize, col: usize) -> T {
        self.elements[row * self.cols + col]
    }

    /// Applies `map` to every element, possibly changing the element type.
    pub fn map<U: Element>(&self, map: impl Fn(T) -> U) -> Matrix<U> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            elements: self.elements.iter().copied().map(map).collect(),
        }
    }

    /// Adds two matrices elementwise. Returns `None` on a shape mismatch.
    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        self.zip_with(rhs, |x, y| x + y)
    }

    /// Subtracts `rhs` elementwise. Returns `None` on a shape mismatch.
    pub fn checked_sub(&self, rhs: &Self) -> Option<Self> {
        self.zip_with(rhs, |x, y| x - y)
    }

    /// Multiplies two matrices elementwise (not the mathematical product;
    /// see [`Self::product()`] for that). Returns `None` on a shape mismatch.
    pub fn elementwise_mul(&self, rhs: &Self) -> Option<Self> {
        self.zip_with(rhs, |x, y| x * y)
    }

    /// Negates every element.
    pub fn negate(&self) -> Self {
        self.map(|x| -x)
    }

    /// Multiplies every element by `scalar`.
    pub fn scale(&self, scalar: T) -> Self {
        self.map(|x| x * scalar)
    }

    /// Divides every element by `scalar`. The caller is responsible for
    /// rejecting a zero divisor where the element type requires it.
    pub fn scale_div(&self, scalar: T) -> Self
    where
        T: Div<Output = T>,
    {
        self.map(|x| x / scalar)
    }

    /// Checks whether the matrix is square.
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Computes the standard matrix product via the O(n^3) triple loop.
    /// Returns `None` unless `self.cols == rhs.rows`.
    pub fn product(&self, rhs: &Self) -> Option<Self> {
        if self.cols != rhs.rows {
            return None;
        }
        let mut elements = Vec::with_capacity(self.rows * rhs.cols);
        for i in 0..self.rows {
            for j in 0..rhs.cols {
                let mut acc = T::zero();
                for k in 0..self.cols {
                    acc = acc + self.get(i, k) * rhs.get(k, j);
                }
                elements.push(acc);
            }
        }
        Self::new(self.rows, rhs.cols, elements)
    }

    /// Transposes the matrix into a new one.
    pub fn transpose(&self) -> Self {
        let mut elements = Vec::with_capacity(self.rows * self.cols);
        for j in 0..self.cols {
            for i in 0..self.rows {
                elements.push(self.get(i, j));
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            elements,
        }
    }

    fn zip_with(&self, rhs: &Self, op: impl Fn(T, T) -> T) -> Option<Self> {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            return None;
        }
        let elements = self
            .elements
            .iter()
            .zip(&rhs.elements)
            .map(|(&x, &y)| op(x, y))
            .collect();
        Some(Self {
            rows: self.rows,
            cols: self.cols,
            elements,
        })
    }
}

impl Matrix<f64> {
    /// Creates an `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut elements = vec![0.0; n * n];
        for i in 0..n {
            elements[i * n + i] = 1.0;
        }
        Self {
            rows: n,
            cols: n,
            elements,
        }
    }

    /// Computes the inverse via Gauss-Jordan elimination. Returns `None` for a
    /// non-square matrix.
    ///
    /// No pivoting is performed, so the result is numerically naive: a zero
    /// pivot produces non-finite entries, and ill-conditioned input loses
    /// precision. This is a documented limitation, not a correctness guarantee.
    pub fn inverse(&self) -> Option<Self> {
        if !self.is_square() {
            return None;
        }
        let n = self.rows;
        let mut work = self.elements.clone();
        let mut inverse = Self::identity(n);

        for i in 0..n {
            let pivot = work[i * n + i];
            for k in 0..n {
                work[i * n + k] /= pivot;
                inverse.elements[i * n + k] /= pivot;
            }
            for j in 0..n {
                if j == i {
                    continue;
                }
                let factor = work[j * n + i];
                for k in 0..n {
                    work[j * n + k] -= factor * work[i * n + k];
                    inverse.elements[j * n + k] -= factor * inverse.elements[i * n + k];
                }
            }
        }
        Some(inverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_matrix(rows: usize, cols: usize, elements: &[i64]) -> Matrix<i64> {
        Matrix::new(rows, cols, elements.to_vec()).unwrap()
    }

    #[test]
    fn vector_arithmetic_checks_dimensions() {
        let u = Vector::new(vec![1, 2, 1]);
        let v = Vector::new(vec![2, 2, 3]);
        assert_eq!(
            u.checked_add(&v).unwrap(),
            Vector::new(vec![3, 4, 4])
        );
        assert_eq!(u.dot(&v), Some(9));

        let short = Vector::new(vec![1, 2]);
        assert_eq!(u.checked_add(&short), None);
        assert_eq!(u.dot(&short), None);
    }

    #[test]
    fn cross_product_requires_three_dimensions() {
        let u = Vector::new(vec![1, 2, 1]);
        let v = Vector::new(vec![2, 2, 3]);
        assert_eq!(u.cross(&v).unwrap(), Vector::new(vec![4, -1, -2]));

        let plane = Vector::new(vec![1, 2]);
        assert_eq!(plane.cross(&v), None);
    }

    #[test]
    fn matrix_product_shape() {
        let lhs = int_matrix(2, 3, &[1, 2, 3, 4, 5, 6]);
        let rhs = int_matrix(3, 2, &[7, 8, 9, 10, 11, 12]);
        let product = lhs.product(&rhs).unwrap();
        assert_eq!(product, int_matrix(2, 2, &[58, 64, 139, 154]));

        let square = int_matrix(2, 2, &[1, 0, 0, 1]);
        assert_eq!(square.product(&rhs).map(|_| ()), None);
    }

    #[test]
    fn matrix_self_product() {
        let a = int_matrix(3, 3, &[1, 2, 3, 3, 2, 1, 4, 5, 6]);
        let squared = a.product(&a).unwrap();
        assert_eq!(
            squared,
            int_matrix(3, 3, &[19, 21, 23, 13, 15, 17, 43, 48, 53])
        );
    }

    #[test]
    fn transpose_swaps_shape() {
        let a = int_matrix(2, 3, &[1, 2, 3, 4, 5, 6]);
        let transposed = a.transpose();
        assert_eq!(transposed, int_matrix(3, 2, &[1, 4, 2, 5, 3, 6]));
        assert_eq!(transposed.transpose(), a);
    }

    #[test]
    fn inverse_of_well_conditioned_matrix() {
        let a = Matrix::new(2, 2, vec![4.0, 7.0, 2.0, 6.0]).unwrap();
        let inverse = a.inverse().unwrap();
        let expected = [0.6, -0.7, -0.2, 0.4];
        for (actual, expected) in inverse.elements().iter().zip(&expected) {
            assert!((actual - expected).abs() < 1e-9, "{actual} vs {expected}");
        }

        let product = a.product(&inverse).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((product.get(i, j) - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn inverse_requires_square_matrix() {
        let a = Matrix::new(2, 3, vec![1.0; 6]).unwrap();
        assert!(a.inverse().is_none());
    }
}

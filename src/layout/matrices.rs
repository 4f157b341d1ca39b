//! The 3x3 signed-permutation matrix vocabulary used for slot direction and
//! flip matrices, on axes `(x, z, s)`.
//!
//! Grounded on `original_source/IDSort/src/id_setup.py`'s `MATRIX_*`
//! constants.

use serde::{Deserialize, Serialize};

/// A signed 3x3 permutation matrix, row-major on axes `(x, z, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix3(pub [[f64; 3]; 3]);

impl Matrix3 {
    pub const IDENTITY: Matrix3 = Matrix3([[1., 0., 0.], [0., 1., 0.], [0., 0., 1.]]);
    pub const ROTX_180: Matrix3 = Matrix3([[1., 0., 0.], [0., -1., 0.], [0., 0., -1.]]);
    pub const ROTZ_180: Matrix3 = Matrix3([[-1., 0., 0.], [0., 1., 0.], [0., 0., -1.]]);
    pub const ROTS_90: Matrix3 = Matrix3([[0., 1., 0.], [-1., 0., 0.], [0., 0., 1.]]);
    pub const ROTS_180: Matrix3 = Matrix3([[-1., 0., 0.], [0., -1., 0.], [0., 0., 1.]]);
    pub const ROTS_270: Matrix3 = Matrix3([[0., -1., 0.], [1., 0., 0.], [0., 0., 1.]]);
    pub const ROTS_270_ROTX_180: Matrix3 = Matrix3([[0., -1., 0.], [-1., 0., 0.], [0., 0., -1.]]);
    pub const ROTS_270_ROTZ_180: Matrix3 = Matrix3([[0., 1., 0.], [1., 0., 0.], [0., 0., -1.]]);

    /// Applies this matrix to a field vector: `m · v`.
    pub fn apply(&self, v: [f64; 3]) -> [f64; 3] {
        let m = &self.0;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_noop() {
        assert_eq!(Matrix3::IDENTITY.apply([1., 2., 3.]), [1., 2., 3.]);
    }

    #[test]
    fn rots_180_negates_x_and_z_only() {
        assert_eq!(Matrix3::ROTS_180.apply([1., 2., 3.]), [-1., -2., 3.]);
    }
}

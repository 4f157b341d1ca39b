//! Electron trajectory integration and phase error (§4.D).
//!
//! Grounded on `original_source/IDSort/src/field_generator.py::
//! calculate_bfield_phase_error`, transcribed as closely as the surrounding
//! Rust idiom allows, including its unexplained quirks: the axis-0 (not
//! axis-S) roll-by-4 of the first-integral trajectory tensor before the
//! second integration, and the `1e-3` fudge factor applied along the way.

use crate::errors::*;
use crate::layout::Info;
use ndarray::{Array1, Array2, Array4};

const ENERGY_GEV: f64 = 3.0;
const ELECTRON_MASS_GEV: f64 = 0.511e-3;
const SPEED_OF_LIGHT: f64 = 2.9911124e8;
const NSKIP: i64 = 8;

fn gamma() -> f64 {
    ENERGY_GEV / ELECTRON_MASS_GEV
}

fn integration_const() -> f64 {
    (0.03 / ENERGY_GEV) * 1e-2
}

/// Rolls a 4-D array by `shift` positions along axis 0 (`nx`), wrapping,
/// matching `numpy.roll(arr, shift, axis=0)`.
fn roll_axis0(arr: &Array4<f64>, shift: i64) -> Array4<f64> {
    let (nx, nz, ns, nc) = arr.dim();
    if nx == 0 {
        return arr.clone();
    }
    let n = nx as i64;
    let shift = ((shift % n) + n) % n;
    let mut out = Array4::<f64>::zeros((nx, nz, ns, nc));
    for ix in 0..nx {
        let src = ((ix as i64 - shift).rem_euclid(n)) as usize;
        for iz in 0..nz {
            for is in 0..ns {
                for c in 0..nc {
                    out[[ix, iz, is, c]] = arr[[src, iz, is, c]];
                }
            }
        }
    }
    out
}

/// Rolls a 4-D array by `shift` positions along axis 2 (`ns`, the S axis),
/// wrapping, matching `numpy.roll(arr, shift, axis=2)`.
fn roll_axis2(arr: &Array4<f64>, shift: i64) -> Array4<f64> {
    let (nx, nz, ns, nc) = arr.dim();
    if ns == 0 {
        return arr.clone();
    }
    let n = ns as i64;
    let shift = ((shift % n) + n) % n;
    let mut out = Array4::<f64>::zeros((nx, nz, ns, nc));
    for ix in 0..nx {
        for iz in 0..nz {
            for is in 0..ns {
                let src = ((is as i64 - shift).rem_euclid(n)) as usize;
                for c in 0..nc {
                    out[[ix, iz, is, c]] = arr[[ix, iz, src, c]];
                }
            }
        }
    }
    out
}

/// Rolls a 2-D array by `shift` positions along axis 0, wrapping.
fn roll2_axis0(arr: &Array2<f64>, shift: i64) -> Array2<f64> {
    let (n, nc) = arr.dim();
    if n == 0 {
        return arr.clone();
    }
    let nn = n as i64;
    let shift = ((shift % nn) + nn) % nn;
    let mut out = Array2::<f64>::zeros((n, nc));
    for i in 0..n {
        let src = ((i as i64 - shift).rem_euclid(nn)) as usize;
        for c in 0..nc {
            out[[i, c]] = arr[[src, c]];
        }
    }
    out
}

/// Cumulative sum of component `component` along axis 2 (S), for every
/// `(ix, iz)`.
fn cumsum_axis2(arr: &Array4<f64>, component: usize) -> ndarray::Array3<f64> {
    let (nx, nz, ns, _) = arr.dim();
    let mut out = ndarray::Array3::<f64>::zeros((nx, nz, ns));
    for ix in 0..nx {
        for iz in 0..nz {
            let mut acc = 0.0;
            for is in 0..ns {
                acc += arr[[ix, iz, is, component]];
                out[[ix, iz, is]] = acc;
            }
        }
    }
    out
}

/// Fits `y = slope * s + intercept` by ordinary least squares.
fn fit_line(s: &Array1<f64>, y: &Array1<f64>) -> Result<(f64, f64)> {
    let n = s.len() as f64;
    if n < 2.0 {
        return Err(ErrorKind::SingularLeastSquares.into());
    }
    let s_mean = s.sum() / n;
    let y_mean = y.sum() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (si, yi) in s.iter().zip(y.iter()) {
        num += (si - s_mean) * (yi - y_mean);
        den += (si - s_mean).powi(2);
    }
    if den.abs() < 1e-12 {
        return Err(ErrorKind::SingularLeastSquares.into());
    }
    let slope = num / den;
    let intercept = y_mean - slope * s_mean;
    Ok((slope, intercept))
}

/// Double-integrates a synthesized `(nx, nz, ns, 3)` field tensor into a
/// `(nx, nz, ns, 4)` trajectory tensor (`[x, z, second_integral_x,
/// second_integral_z]`), and computes the central electron trajectory's
/// RMS phase error in degrees against the device's design period.
///
/// Steps (§4.D):
/// 1. trapezoidal-integrate `bfield` along S into `trap_b`.
/// 2. cumulative-sum `trap_b` along S into the trajectory's second
///    integrals (components 2, 3).
/// 3. roll the trajectory tensor by 4 along axis 0 (preserved as-is; see
///    module docs), trapezoidal-integrate again, cumulative-sum into the
///    first integrals (components 0, 1).
/// 4. extract the central row/column (`i = (nx+1)/2 - 1`, `j = (nz+1)/2 -
///    1`) and square its second integrals.
/// 5. trapezoidal-integrate and cumulative-sum that into a phase array.
/// 6. add a linear term scaled by the electron's Lorentz gamma.
/// 7. sample at a quarter-period stride over the window `4·nperiods -
///    2·nskip` points.
/// 8. least-squares fit a line to the samples; the phase error is the
///    RMS residual scaled by `(2π/(m·s_steps_per_period))²` and converted
///    to degrees.
pub fn compute(info: &Info, bfield: &Array4<f64>) -> Result<(f64, Array4<f64>)> {
    let (nx, nz, ns, nc) = bfield.dim();
    if nc != 3 {
        return Err(Error::from(format!("trajectory::compute expects a 3-component field, got {}", nc)));
    }
    let sstep = info.s.step;

    // Step 1: trapezoidal rule along S.
    let mut trap_b = roll_axis2(bfield, 1);
    for ix in 0..nx {
        for iz in 0..nz {
            for c in 0..3 {
                trap_b[[ix, iz, 0, c]] = 0.0;
            }
        }
    }
    let trap_b = (&trap_b + bfield).mapv(|v| v * (sstep / 2.0));

    // Step 2: first cumulative sum into the second integrals.
    let c = integration_const();
    let cum_bz = cumsum_axis2(&trap_b, 1);
    let cum_bx = cumsum_axis2(&trap_b, 0);
    let mut t = Array4::<f64>::zeros((nx, nz, ns, 4));
    for ix in 0..nx {
        for iz in 0..nz {
            for is in 0..ns {
                t[[ix, iz, is, 2]] = -cum_bz[[ix, iz, is]] * c;
                t[[ix, iz, is, 3]] = cum_bx[[ix, iz, is]] * c;
            }
        }
    }

    // Step 3: axis-0 roll-by-4 (preserved quirk), trapezoidal rule along
    // S, second cumulative sum into the first integrals.
    let mut trap_t = roll_axis0(&t, 4);
    for ix in 0..nx {
        for iz in 0..nz {
            for comp in 0..4 {
                trap_t[[ix, iz, 0, comp]] = 0.0;
            }
        }
    }
    let trap_t = (&trap_t + &t).mapv(|v| v * (sstep / 2.0));
    let cum_t2 = cumsum_axis2(&trap_t, 2);
    let cum_t3 = cumsum_axis2(&trap_t, 3);
    for ix in 0..nx {
        for iz in 0..nz {
            for is in 0..ns {
                t[[ix, iz, is, 0]] = cum_t2[[ix, iz, is]];
                t[[ix, iz, is, 1]] = cum_t3[[ix, iz, is]];
            }
        }
    }

    // Step 4: central row/column, squared second integrals.
    let i = ((nx + 1) / 2).saturating_sub(1);
    let j = ((nz + 1) / 2).saturating_sub(1);
    let mut w = Array2::<f64>::zeros((ns, 2));
    for is in 0..ns {
        w[[is, 0]] = t[[i, j, is, 2]].powi(2);
        w[[is, 1]] = t[[i, j, is, 3]].powi(2);
    }

    // Step 5: trapezoidal rule and cumulative sum into the phase array.
    let mut trap_w = roll2_axis0(&w, 1);
    for comp in 0..2 {
        trap_w[[0, comp]] = 0.0;
    }
    let trap_w = (&trap_w + &w).mapv(|v| v * 1e-3 * (sstep / 2.0));
    let mut ph0 = vec![0.0; ns];
    let mut acc = 0.0;
    for is in 0..ns {
        acc += trap_w[[is, 0]] + trap_w[[is, 1]];
        ph0[is] = acc / (2.0 * SPEED_OF_LIGHT);
    }

    // Step 6: add the linear design-trajectory term.
    let gamma = gamma();
    let factor = sstep * (1e-3 / (2.0 * SPEED_OF_LIGHT * gamma * gamma));
    let ph1: Vec<f64> = ph0.iter().enumerate().map(|(k, &p)| p + factor * (k as f64)).collect();

    // Step 7: quarter-period stride sampling.
    let nperiods = info.nperiods as i64;
    let s_steps_per_period = (info.period_length / sstep).round() as i64;
    if s_steps_per_period <= 0 {
        return Err(ErrorKind::SingularLeastSquares.into());
    }
    let qtr = s_steps_per_period / 4;
    if qtr <= 0 {
        return Err(ErrorKind::SingularLeastSquares.into());
    }
    let s_total_steps = ns as i64;
    let count = 4 * nperiods - 2 * NSKIP;
    if count < 2 {
        return Err(ErrorKind::SingularLeastSquares.into());
    }
    let offset = (s_total_steps / 2) - nperiods * (s_steps_per_period / 2) + (NSKIP - 1) * qtr;

    let mut v0 = Vec::with_capacity(count as usize);
    let mut v1 = Vec::with_capacity(count as usize);
    for k in 0..count {
        let idx = qtr * k + offset;
        if idx < 0 || idx as usize >= ph1.len() {
            return Err(ErrorKind::SingularLeastSquares.into());
        }
        v0.push(idx as f64);
        v1.push(ph1[idx as usize]);
    }
    let v0 = Array1::from(v0);
    let v1 = Array1::from(v1);

    // Step 8: least-squares line fit and the final phase error.
    let (m, b) = fit_line(&v0, &v1)?;
    let resid_sq: f64 = v0.iter().zip(v1.iter()).map(|(&x, &y)| (y - (m * x + b)).powi(2)).sum();
    let omega_sq = (2.0 * std::f64::consts::PI / (m * s_steps_per_period as f64)).powi(2);
    let denom = ((4 * nperiods + 1) - (2 * NSKIP)) as f64;
    let phase_error = ((resid_sq * omega_sq) / denom).sqrt() * (360.0 / (2.0 * std::f64::consts::PI));

    Ok((phase_error, t))
}

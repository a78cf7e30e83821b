// SPDX-License-Identifier: AGPL-3.0-only

//! Bessel functions of the first kind, J_m(x) for m = 0, 1, 2, ...
//!
//! Miller's backward recurrence J_{k−1} = (2k/x) J_k − J_{k+1} started far
//! above the requested orders, normalized by J₀ + 2Σ J_{2k} = 1. Forward
//! recurrence is unstable for m > x; backward is stable for every order.

/// Magnitude at which the backward sweep rescales to avoid overflow.
const RESCALE_THRESHOLD: f64 = 1e200;

/// Below this |x| the first backward step 2k/x overflows; the leading
/// series term (x/2)^m / m! is exact to f64 precision there.
const SMALL_ARGUMENT: f64 = 1e-100;

/// J₀(x) .. J_{count−1}(x).
#[must_use]
pub fn bessel_sequence(x: f64, count: usize) -> Vec<f64> {
    let mut out = vec![0.0; count];
    if count == 0 {
        return out;
    }
    let ax = x.abs();
    if ax == 0.0 {
        out[0] = 1.0;
        return out;
    }
    if ax < SMALL_ARGUMENT {
        out[0] = 1.0;
        for m in 1..count {
            out[m] = out[m - 1] * (0.5 * x) / m as f64;
        }
        return out;
    }

    let top = count.max(ax.ceil() as usize);
    let start = 2 * ((top + 15 + (40.0 * top as f64).sqrt() as usize) / 2);
    let mut j = vec![0.0; start + 2];
    j[start] = 1.0;

    for k in (1..=start).rev() {
        let prev = (2.0 * k as f64 / ax).mul_add(j[k], -j[k + 1]);
        j[k - 1] = prev;
        if prev.abs() > RESCALE_THRESHOLD {
            for v in &mut j[k - 1..] {
                *v /= RESCALE_THRESHOLD;
            }
        }
    }

    let norm = j[0] + 2.0 * j.iter().skip(2).step_by(2).sum::<f64>();
    for (m, (o, v)) in out.iter_mut().zip(&j).enumerate() {
        *o = v / norm;
        if x < 0.0 && m % 2 == 1 {
            *o = -*o;
        }
    }
    out
}

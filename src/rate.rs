// Copyright (c) 2017-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Motion-vector bit-cost model.
//!
//! Used to order DRL indices and search refinements only; the absolute
//! rate of a candidate comes from the external RD oracle.

use crate::mv::{mv_joint_type, MotionVector};

/// Fixed-point fraction-of-a-bit resolution of rate values.
pub const OD_BITRES: u8 = 3;

// Joint-symbol cost in bits, indexed by MvJointType.
const MV_JOINT_BITS: [u32; 4] = [1, 3, 3, 4];

// DRL index signalling cost in bits; index 0 is cheapest by construction.
const DRL_BITS: [u32; 4] = [0, 1, 2, 2];

fn diff_to_rate(diff: i16, allow_high_precision_mv: bool) -> u32 {
  let d = if allow_high_precision_mv { diff } else { diff >> 1 };
  if d == 0 {
    0
  } else {
    2 * (16 - d.abs().leading_zeros())
  }
}

/// Bit cost of coding `mv` against predictor `ref_mv`, in 1/8-bit units.
pub fn mv_bit_cost(
  mv: MotionVector, ref_mv: MotionVector, allow_high_precision_mv: bool,
) -> u32 {
  let diff = MotionVector { row: mv.row - ref_mv.row, col: mv.col - ref_mv.col };
  let joint = MV_JOINT_BITS[mv_joint_type(diff) as usize];
  let comp = diff_to_rate(diff.row, allow_high_precision_mv)
    + diff_to_rate(diff.col, allow_high_precision_mv);
  (joint + comp) << OD_BITRES
}

/// Bit cost of signalling DRL index `drl`, in 1/8-bit units.
#[inline]
pub fn drl_bit_cost(drl: usize) -> u32 {
  DRL_BITS[drl.min(DRL_BITS.len() - 1)] << OD_BITRES
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_diff_costs_joint_only() {
    let mv = MotionVector::new(12, -4);
    assert_eq!(mv_bit_cost(mv, mv, true), MV_JOINT_BITS[0] << OD_BITRES);
  }

  #[test]
  fn cost_grows_with_distance() {
    let z = MotionVector::default();
    let near = mv_bit_cost(MotionVector::new(2, 0), z, true);
    let far = mv_bit_cost(MotionVector::new(64, 0), z, true);
    assert!(far > near);
  }

  #[test]
  fn low_precision_ignores_hp_bit() {
    let z = MotionVector::default();
    let a = mv_bit_cost(MotionVector::new(8, 0), z, false);
    let b = mv_bit_cost(MotionVector::new(9, 0), z, false);
    assert_eq!(a, b);
  }

  #[test]
  fn drl_zero_is_cheapest() {
    assert!(drl_bit_cost(0) < drl_bit_cost(1));
    assert!(drl_bit_cost(1) <= drl_bit_cost(3));
  }
}

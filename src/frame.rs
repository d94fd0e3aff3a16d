// Copyright (c) 2018-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Read-only sequence and frame snapshots handed to the kernel per block.

#![allow(non_camel_case_types)]

use crate::mv::MotionVector;
use crate::partition::{BlockSize, MI_SIZE};
use crate::refs::{RefType, TOTAL_REFS_PER_FRAME};
use crate::serialize::{Deserialize, Serialize};

pub const WARPEDMODEL_PREC_BITS: usize = 16;
const GM_TRANS_ONLY_PREC_DIFF: usize = WARPEDMODEL_PREC_BITS - 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SliceType {
  I,
  P,
  B,
}

impl SliceType {
  #[inline]
  pub fn is_intra(self) -> bool {
    self == SliceType::I
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReferenceMode {
  SINGLE = 0,
  COMPOUND = 1,
  SELECT = 2,
}

/// Frame-level skip-mode signalling state. When allowed, an AVG compound
/// candidate on exactly `(ref0, ref1)` may be coded as skip-mode.
#[derive(Copy, Clone, Debug)]
pub struct SkipModeParams {
  pub skip_mode_allowed: bool,
  pub ref0: RefType,
  pub ref1: RefType,
}

impl Default for SkipModeParams {
  fn default() -> Self {
    SkipModeParams {
      skip_mode_allowed: false,
      ref0: RefType::NONE_FRAME,
      ref1: RefType::NONE_FRAME,
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd)]
pub enum GlobalMVMode {
  IDENTITY = 0,    // identity transformation, 0-parameter
  TRANSLATION = 1, // translational motion 2-parameter
  ROTZOOM = 2,     // simplified affine with rotation + zoom only, 4-parameter
  AFFINE = 3,      // affine, 6-parameter
}

/// Warped (affine) motion model, frame-global or fitted per block.
///
/// Projection convention: `x' = m[2]*x + m[3]*y + m[0]`,
/// `y' = m[4]*x + m[5]*y + m[1]`, all in `WARPEDMODEL_PREC_BITS`
/// fixed point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WarpedMotionParams {
  pub wm_type: GlobalMVMode,
  pub wm_mat: [i32; 6],
  pub alpha: i16,
  pub beta: i16,
  pub gamma: i16,
  pub delta: i16,
}

impl Default for WarpedMotionParams {
  fn default() -> Self {
    WarpedMotionParams::IDENTITY
  }
}

impl WarpedMotionParams {
  pub const IDENTITY: WarpedMotionParams = WarpedMotionParams {
    wm_type: GlobalMVMode::IDENTITY,
    wm_mat: [0, 0, 1 << WARPEDMODEL_PREC_BITS, 0, 0, 1 << WARPEDMODEL_PREC_BITS],
    alpha: 0,
    beta: 0,
    gamma: 0,
    delta: 0,
  };

  #[inline]
  pub fn is_identity(&self) -> bool {
    self.wm_type == GlobalMVMode::IDENTITY
  }

  #[inline]
  pub fn is_translation(&self) -> bool {
    self.wm_type == GlobalMVMode::TRANSLATION
  }
}

#[inline]
const fn round_power_of_two_signed(value: i64, n: usize) -> i64 {
  if value < 0 {
    -((-value + (1 << (n - 1)) as i64) >> n)
  } else {
    (value + (1 << (n - 1)) as i64) >> n
  }
}

/// MV implied by a global-motion model at a block, in 1/8-pel units,
/// reduced to the precision the frame header allows.
pub fn gm_get_motion_vector(
  gm: &WarpedMotionParams, allow_high_precision_mv: bool,
  force_integer_mv: bool, bsize: BlockSize, mi_col: usize, mi_row: usize,
) -> MotionVector {
  if gm.is_identity() {
    return MotionVector::default();
  }

  if gm.is_translation() {
    // The translation components are stored in WARPEDMODEL_PREC_BITS
    // fixed point and must be taken down to 1/8-pel block precision.
    let mv = MotionVector {
      col: (gm.wm_mat[0] >> GM_TRANS_ONLY_PREC_DIFF) as i16,
      row: (gm.wm_mat[1] >> GM_TRANS_ONLY_PREC_DIFF) as i16,
    };
    return mv.lower_precision(allow_high_precision_mv, force_integer_mv);
  }

  // Project the block centre through the affine model.
  let x = (mi_col * MI_SIZE + bsize.width() / 2 - 1) as i64;
  let y = (mi_row * MI_SIZE + bsize.height() / 2 - 1) as i64;

  let mat = &gm.wm_mat;
  let one = 1i64 << WARPEDMODEL_PREC_BITS;
  let xc = (mat[2] as i64 - one) * x + mat[3] as i64 * y + mat[0] as i64;
  let yc = mat[4] as i64 * x + (mat[5] as i64 - one) * y + mat[1] as i64;

  let shift = if allow_high_precision_mv {
    WARPEDMODEL_PREC_BITS - 3
  } else {
    WARPEDMODEL_PREC_BITS - 2
  };
  let scale = if allow_high_precision_mv { 1 } else { 2 };

  let mv = MotionVector {
    col: (round_power_of_two_signed(xc, shift) * scale) as i16,
    row: (round_power_of_two_signed(yc, shift) * scale) as i16,
  };
  mv.lower_precision(allow_high_precision_mv, force_integer_mv)
}

/// Sequence-level toggles the kernel consumes.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct SequenceInfo {
  pub sb_size: usize,
  pub bit_depth: usize,
  pub enable_filter_intra: bool,
  pub enable_palette: bool,
  pub enable_intrabc: bool,
  /// When set, MVs are not constrained to the tile (`umv0tile` off).
  pub unrestricted_motion_vector: bool,
  pub disable_cfl: bool,
}

impl Default for SequenceInfo {
  fn default() -> Self {
    SequenceInfo {
      sb_size: 64,
      bit_depth: 8,
      enable_filter_intra: false,
      enable_palette: false,
      enable_intrabc: false,
      unrestricted_motion_vector: false,
      disable_cfl: false,
    }
  }
}

/// Per-frame header snapshot.
#[derive(Clone, Debug)]
pub struct FrameInfo {
  pub slice_type: SliceType,
  pub reference_mode: ReferenceMode,
  pub allow_high_precision_mv: bool,
  pub force_integer_mv: bool,
  pub skip_mode: SkipModeParams,
  pub base_q_idx: u8,
  pub reduced_tx_set: bool,
  pub is_motion_mode_switchable: bool,
  pub allow_intrabc: bool,
  pub temporal_layer_index: u8,
  pub is_used_as_reference: bool,
  pub ref_list0_count: usize,
  pub ref_list1_count: usize,
  pub global_motion: [WarpedMotionParams; TOTAL_REFS_PER_FRAME],
}

impl Default for FrameInfo {
  fn default() -> Self {
    FrameInfo {
      slice_type: SliceType::I,
      reference_mode: ReferenceMode::SINGLE,
      allow_high_precision_mv: false,
      force_integer_mv: false,
      skip_mode: SkipModeParams::default(),
      base_q_idx: 32,
      reduced_tx_set: false,
      is_motion_mode_switchable: false,
      allow_intrabc: false,
      temporal_layer_index: 0,
      is_used_as_reference: true,
      ref_list0_count: 0,
      ref_list1_count: 0,
      global_motion: [WarpedMotionParams::IDENTITY; TOTAL_REFS_PER_FRAME],
    }
  }
}

impl FrameInfo {
  #[inline]
  pub fn compound_allowed(&self) -> bool {
    self.slice_type == SliceType::B
      && self.reference_mode != ReferenceMode::SINGLE
      && self.ref_list1_count > 0
  }

  /// The global-motion model for a reference, identity when unset.
  #[inline]
  pub fn global_motion_for(&self, rf: RefType) -> &WarpedMotionParams {
    &self.global_motion[rf as usize]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::partition::BlockSize::*;

  #[test]
  fn identity_model_gives_zero_mv() {
    let gm = WarpedMotionParams::IDENTITY;
    let mv = gm_get_motion_vector(&gm, true, false, BLOCK_16X16, 4, 4);
    assert!(mv.is_zero());
  }

  #[test]
  fn translation_model_shifts_to_eighth_pel() {
    let mut gm = WarpedMotionParams::IDENTITY;
    gm.wm_type = GlobalMVMode::TRANSLATION;
    gm.wm_mat[0] = 16 << GM_TRANS_ONLY_PREC_DIFF; // +2 pels horizontally
    gm.wm_mat[1] = -8 << GM_TRANS_ONLY_PREC_DIFF;
    let mv = gm_get_motion_vector(&gm, true, false, BLOCK_16X16, 0, 0);
    assert_eq!(mv, MotionVector::new(16, -8));
  }

  #[test]
  fn translation_respects_low_precision() {
    let mut gm = WarpedMotionParams::IDENTITY;
    gm.wm_type = GlobalMVMode::TRANSLATION;
    gm.wm_mat[0] = 9 << GM_TRANS_ONLY_PREC_DIFF;
    let mv = gm_get_motion_vector(&gm, false, false, BLOCK_16X16, 0, 0);
    assert_eq!(mv.col % 2, 0);
  }

  #[test]
  fn rotzoom_projects_block_centre() {
    let mut gm = WarpedMotionParams::IDENTITY;
    gm.wm_type = GlobalMVMode::ROTZOOM;
    // pure 2x zoom: offsets grow with distance from the origin
    gm.wm_mat[2] = (1 << WARPEDMODEL_PREC_BITS) + (1 << 10);
    let near = gm_get_motion_vector(&gm, true, false, BLOCK_8X8, 0, 0);
    let far = gm_get_motion_vector(&gm, true, false, BLOCK_8X8, 32, 0);
    assert!(far.col > near.col);
    assert_eq!(near.row, 0);
  }
}

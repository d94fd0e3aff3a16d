// Copyright (c) 2020-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Inter-intra side search: joint selection of the blend mode and a wedge
//! for uni-pred NEAREST/NEAR/NEW candidates.

use crate::buffers::{diff_block, subtract_block};
use crate::mv::MotionVector;
use crate::oracle::MdOracles;
use crate::partition::BlockSize;
use crate::predict::{
  pred_for_interintra_mode, InterIntraMode, PredictionMode,
  INTER_INTRA_MODES_ALL,
};
use crate::refs::RefFrames;
use crate::serialize::{Deserialize, Serialize};
use v_frame::pixel::Pixel;
use v_frame::plane::{Plane, PlaneOffset};

/// Largest block edge inter-intra applies to.
pub const MAX_INTERINTRA_SB_SQUARE: usize = 32 * 32;
const MAX_INTERINTRA_DIM: usize = 32;

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct InterIntraCtrls {
  pub enabled: bool,
  /// Also emit the wedge variant where the block supports it.
  pub allow_wedge: bool,
}

#[inline]
pub fn is_interintra_allowed_bsize(bsize: BlockSize) -> bool {
  let (w, h) = (bsize.width(), bsize.height());
  (8..=MAX_INTERINTRA_DIM).contains(&w) && (8..=MAX_INTERINTRA_DIM).contains(&h)
}

#[inline]
pub fn is_interintra_allowed_mode(mode: PredictionMode) -> bool {
  matches!(
    mode,
    PredictionMode::NEARESTMV | PredictionMode::NEARMV | PredictionMode::NEWMV
  )
}

#[inline]
pub fn is_interintra_allowed(
  ctrls: &InterIntraCtrls, bsize: BlockSize, mode: PredictionMode,
  rf: RefFrames,
) -> bool {
  ctrls.enabled
    && is_interintra_allowed_bsize(bsize)
    && is_interintra_allowed_mode(mode)
    && !rf.is_compound()
    && !rf.is_intra()
}

/// The four cached luma intra predictions, computed once per block before
/// any inter-intra candidate is searched.
pub struct InterIntraPredCache<T: Pixel> {
  planes: [Plane<T>; 4],
  valid: bool,
}

impl<T: Pixel> InterIntraPredCache<T> {
  pub fn new() -> Self {
    InterIntraPredCache {
      planes: [
        Plane::new(MAX_INTERINTRA_DIM, MAX_INTERINTRA_DIM, 0, 0, 0, 0),
        Plane::new(MAX_INTERINTRA_DIM, MAX_INTERINTRA_DIM, 0, 0, 0, 0),
        Plane::new(MAX_INTERINTRA_DIM, MAX_INTERINTRA_DIM, 0, 0, 0, 0),
        Plane::new(MAX_INTERINTRA_DIM, MAX_INTERINTRA_DIM, 0, 0, 0, 0),
      ],
      valid: false,
    }
  }

  #[inline]
  pub fn is_valid(&self) -> bool {
    self.valid
  }

  #[inline]
  pub fn invalidate(&mut self) {
    self.valid = false;
  }

  #[inline]
  pub fn plane(&self, mode: InterIntraMode) -> &Plane<T> {
    debug_assert!(self.valid);
    &self.planes[mode as usize]
  }
}

impl<T: Pixel> Default for InterIntraPredCache<T> {
  fn default() -> Self {
    Self::new()
  }
}

/// Fills the cache from the block's reconstructed neighbour edges.
pub fn precompute_intra_pred_for_inter_intra<T: Pixel>(
  cache: &mut InterIntraPredCache<T>, above: &[T], left: &[T], w: usize,
  h: usize,
) {
  debug_assert!(w <= MAX_INTERINTRA_DIM && h <= MAX_INTERINTRA_DIM);
  for mode in INTER_INTRA_MODES_ALL {
    let plane = &mut cache.planes[mode as usize];
    let stride = plane.cfg.stride;
    pred_for_interintra_mode(
      mode,
      plane.data_origin_mut(),
      stride,
      above,
      left,
      w,
      h,
    );
  }
  cache.valid = true;
}

/// Winner of the joint mode + wedge search for one underlying MV.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InterIntraSearch {
  pub mode: InterIntraMode,
  pub wedge_index: i8,
}

/// Selects the blend mode by the fast RD model over the four cached intra
/// predictions, then picks a fixed-sign wedge for the winner.
pub fn search_interintra<T: Pixel, O: MdOracles<T>>(
  oracles: &O, src: &Plane<T>, src_off: PlaneOffset,
  cache: &InterIntraPredCache<T>, rf: RefFrames, mv: MotionVector,
  bsize: BlockSize, mi_row: usize, mi_col: usize,
) -> InterIntraSearch {
  let w = bsize.width();
  let h = bsize.height();
  let zero_off = PlaneOffset { x: 0, y: 0 };

  let mut inter: Plane<T> = Plane::new(w, h, 0, 0, 0, 0);
  let mut combined: Plane<T> = Plane::new(w, h, 0, 0, 0, 0);

  oracles.predict_inter(
    rf,
    [mv, MotionVector::default()],
    bsize,
    mi_row,
    mi_col,
    &mut inter,
    zero_off,
  );

  let mut best_mode = InterIntraMode::II_DC_PRED;
  let mut best_cost = u64::MAX;
  for mode in INTER_INTRA_MODES_ALL {
    oracles.combine_interintra(
      mode,
      None,
      w,
      h,
      &inter,
      cache.plane(mode),
      &mut combined,
    );
    let est =
      oracles.model_rd_curvfit(src, src_off, &combined, zero_off, w, h);
    let cost = est.cost(1);
    if cost < best_cost {
      best_cost = cost;
      best_mode = mode;
    }
  }

  // Wedge selection over residual1 = src - p1 and diff10 = p1 - p0.
  let mut residual1 = vec![0i16; w * h];
  let mut diff10 = vec![0i16; w * h];
  subtract_block(&mut residual1, w, src, src_off, &inter, zero_off, w, h);
  diff_block(&mut diff10, w, &inter, zero_off, cache.plane(best_mode), zero_off, w, h);
  let (wedge_index, _rd) =
    oracles.pick_wedge_fixed_sign(&residual1, &diff10, w, h);

  InterIntraSearch { mode: best_mode, wedge_index }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::partition::BlockSize::*;
  use crate::refs::RefType::*;

  #[test]
  fn bsize_gate() {
    assert!(is_interintra_allowed_bsize(BLOCK_8X8));
    assert!(is_interintra_allowed_bsize(BLOCK_16X32));
    assert!(is_interintra_allowed_bsize(BLOCK_32X32));
    assert!(!is_interintra_allowed_bsize(BLOCK_4X4));
    assert!(!is_interintra_allowed_bsize(BLOCK_64X64));
    assert!(!is_interintra_allowed_bsize(BLOCK_4X16));
  }

  #[test]
  fn mode_and_ref_gate() {
    let ctrls = InterIntraCtrls { enabled: true, allow_wedge: true };
    let uni = RefFrames::single(LAST_FRAME);
    assert!(is_interintra_allowed(
      &ctrls,
      BLOCK_16X16,
      PredictionMode::NEWMV,
      uni
    ));
    assert!(!is_interintra_allowed(
      &ctrls,
      BLOCK_16X16,
      PredictionMode::GLOBALMV,
      uni
    ));
    assert!(!is_interintra_allowed(
      &ctrls,
      BLOCK_16X16,
      PredictionMode::NEWMV,
      RefFrames::pair(LAST_FRAME, BWDREF_FRAME)
    ));
    let off = InterIntraCtrls { enabled: false, allow_wedge: false };
    assert!(!is_interintra_allowed(
      &off,
      BLOCK_16X16,
      PredictionMode::NEWMV,
      uni
    ));
  }

  #[test]
  fn precompute_marks_cache_valid() {
    let mut cache: InterIntraPredCache<u8> = InterIntraPredCache::new();
    assert!(!cache.is_valid());
    let above = [128u8; 32];
    let left = [128u8; 32];
    precompute_intra_pred_for_inter_intra(&mut cache, &above, &left, 16, 16);
    assert!(cache.is_valid());
    // flat edges produce flat predictions in every mode
    for mode in INTER_INTRA_MODES_ALL {
      let p = cache.plane(mode);
      let stride = p.cfg.stride;
      for y in 0..16 {
        for x in 0..16 {
          assert_eq!(p.data_origin()[y * stride + x], 128);
        }
      }
    }
    cache.invalidate();
    assert!(!cache.is_valid());
  }
}

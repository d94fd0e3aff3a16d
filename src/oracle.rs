// Copyright (c) 2020-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! The seam to the external collaborators: prediction, fast RD modelling,
//! the search primitives and the fit routines live outside this crate and
//! are reached through [`MdOracles`].
//!
//! A failing oracle never aborts mode decision; the affected candidate is
//! simply not injected.

use crate::frame::WarpedMotionParams;
use crate::mv::MotionVector;
use crate::partition::BlockSize;
use crate::predict::{InterIntraMode, PaletteInfo};
use crate::refs::{RefFrames, RefType};
use crate::tile::MvLimits;
use arrayvec::ArrayVec;
use v_frame::pixel::Pixel;
use v_frame::plane::{Plane, PlaneOffset};

/// Most palette candidates the luma palette search may hand back.
pub const PALETTE_CAND_MAX: usize = 14;

/// Fast rate/distortion estimate from the curve-fit model.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RdEstimate {
  pub rate: u32,
  pub distortion: u64,
}

impl RdEstimate {
  /// Scalar cost under `lambda` in the usual `dist + lambda*rate` form.
  #[inline]
  pub fn cost(&self, lambda: u64) -> u64 {
    self.distortion.saturating_add(lambda.saturating_mul(self.rate as u64))
  }
}

/// Outcome of a full-pel search primitive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
  pub mv: MotionVector,
  pub distortion: u32,
}

/// Mask parameters produced by the masked-compound fit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MaskedCompoundFit {
  pub mask_type: u8,
  pub wedge_index: i8,
  pub wedge_sign: u8,
}

/// External collaborators of the mode-decision kernel (contractual call
/// signatures; the encoder wires its real pipeline in, tests use stubs).
///
/// Implementations may keep internal scratch behind interior mutability;
/// the kernel only ever calls through `&self` from a single thread.
pub trait MdOracles<T: Pixel> {
  /// Motion-compensated prediction of the block into `dst` at `dst_off`,
  /// simple translation, both lists for compound pairs.
  fn predict_inter(
    &self, rf: RefFrames, mv: [MotionVector; 2], bsize: BlockSize,
    mi_row: usize, mi_col: usize, dst: &mut Plane<T>, dst_off: PlaneOffset,
  );

  /// Blends an inter and an intra prediction under `mode`, optionally
  /// through a wedge mask.
  fn combine_interintra(
    &self, mode: InterIntraMode, wedge: Option<(i8, bool)>, w: usize,
    h: usize, inter: &Plane<T>, intra: &Plane<T>, dst: &mut Plane<T>,
  );

  /// Curve-fit RD model over one block of source vs prediction.
  fn model_rd_curvfit(
    &self, src: &Plane<T>, src_off: PlaneOffset, pred: &Plane<T>,
    pred_off: PlaneOffset, w: usize, h: usize,
  ) -> RdEstimate;

  /// Scans the fixed-sign wedge codebook over the two difference signals
  /// and returns `(wedge_index, rd)` of the best entry.
  fn pick_wedge_fixed_sign(
    &self, residual1: &[i16], diff10: &[i16], w: usize, h: usize,
  ) -> (i8, u64);

  /// Full-pel search (IntraBC DV search driver). `None` when the search
  /// found nothing inside `limits`.
  fn full_pixel_search(
    &self, src: &Plane<T>, src_off: PlaneOffset, start_mv: MotionVector,
    limits: &MvLimits, w: usize, h: usize,
  ) -> Option<SearchResult>;

  /// OBMC-cost full-pel search seeded at `start_mv`.
  fn obmc_full_pixel_search(
    &self, start_mv: MotionVector, limits: &MvLimits, w: usize, h: usize,
  ) -> Option<SearchResult>;

  /// OBMC sub-pel refinement around a full-pel winner.
  fn obmc_subpel_refine(
    &self, mv: MotionVector, limits: &MvLimits, w: usize, h: usize,
  ) -> Option<MotionVector>;

  /// Fits the local warped model implied by `mv` on `rf`. `None` marks an
  /// invalid fit; the second element counts the projected refs used.
  fn warped_motion_parameters(
    &self, rf: RefType, mv: MotionVector, bsize: BlockSize, mi_row: usize,
    mi_col: usize,
  ) -> Option<(WarpedMotionParams, u8)>;

  /// Mask fit for the DIFF/WEDGE compound types of one bi-pred MV pair.
  /// `Err` aborts emission of the remaining masked types for that pair.
  fn calc_pred_masked_compound(
    &self, rf: RefFrames, mv: [MotionVector; 2], bsize: BlockSize,
    mi_row: usize, mi_col: usize,
  ) -> Result<MaskedCompoundFit, ()>;

  /// Luma palette search; an empty result injects nothing.
  fn search_palette_luma(
    &self, src: &Plane<T>, src_off: PlaneOffset, bsize: BlockSize,
    max_candidates: usize,
  ) -> ArrayVec<PaletteInfo, PALETTE_CAND_MAX>;

  /// Fills the above/left overlap predictions used by the OBMC cost.
  fn precompute_obmc_data(&self, bsize: BlockSize, mi_row: usize, mi_col: usize);

  /// Number of overlappable (above, left) neighbours of the block.
  fn count_overlappable_neighbors(
    &self, bsize: BlockSize, mi_row: usize, mi_col: usize,
  ) -> (u8, u8);
}

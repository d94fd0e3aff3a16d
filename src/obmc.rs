// Copyright (c) 2020-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! OBMC motion-mode gating and the sub-pel MV refinement that runs under
//! the overlap-compensated cost.

use crate::frame::FrameInfo;
use crate::mv::MotionVector;
use crate::oracle::MdOracles;
use crate::partition::BlockSize;
use crate::predict::PredictionMode;
use crate::refs::RefFrames;
use crate::serialize::{Deserialize, Serialize};
use crate::tile::MvLimits;
use v_frame::pixel::Pixel;

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct ObmcCtrls {
  pub enabled: bool,
  /// Run the sub-pel tree after a successful full-pel OBMC search.
  pub refine_subpel: bool,
}

/// OBMC needs a switchable motion mode, a uni-pred candidate on a block
/// of at least 8x8, and at least one overlappable neighbour.
pub fn is_obmc_allowed(
  ctrls: &ObmcCtrls, frame: &FrameInfo, bsize: BlockSize,
  mode: PredictionMode, rf: RefFrames, overlappable_neighbors: (u8, u8),
) -> bool {
  ctrls.enabled
    && frame.is_motion_mode_switchable
    && mode.is_inter()
    && !rf.is_compound()
    && !rf.is_intra()
    && bsize.width() >= 8
    && bsize.height() >= 8
    && (overlappable_neighbors.0 > 0 || overlappable_neighbors.1 > 0)
}

/// Refines a NEW-MV OBMC candidate: full-pel search seeded at the
/// candidate MV, then optionally the sub-pel tree. Returns the refined MV
/// or `None` when the full-pel stage finds nothing, in which case the
/// candidate keeps its original MV.
pub fn obmc_refine_mv<T: Pixel, O: MdOracles<T>>(
  oracles: &O, ctrls: &ObmcCtrls, mv: MotionVector, limits: &MvLimits,
  bsize: BlockSize,
) -> Option<MotionVector> {
  let w = bsize.width();
  let h = bsize.height();
  let full = oracles.obmc_full_pixel_search(mv, limits, w, h)?;
  if !ctrls.refine_subpel {
    return Some(full.mv);
  }
  Some(oracles.obmc_subpel_refine(full.mv, limits, w, h).unwrap_or(full.mv))
}

// Copyright (c) 2017-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Intra-family injectors: the directional/non-directional luma modes,
//! filter intra, the palette candidates and IntraBC.

use crate::candidate::ModeDecisionCandidate;
use crate::frame::{FrameInfo, SequenceInfo};
use crate::intrabc::{search_intrabc_dv, select_ref_dv};
use crate::md::{BlockCtx, ModeDecisionContext};
use crate::oracle::{MdOracles, PALETTE_CAND_MAX};
use crate::predict::{
  PredictionMode, FILTER_INTRA_MODES_ALL, MAX_ANGLE_DELTA, MD_INTRA_MODES,
};
use crate::serialize::{Deserialize, Serialize};
use v_frame::pixel::Pixel;

/// Intra enumeration controls. `angle_delta_count` is 1, 5 or 7: zero
/// first, then the +/- deltas in growing magnitude.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct IntraCtrls {
  pub enabled: bool,
  pub angle_delta_count: usize,
  pub enable_paeth: bool,
  pub enable_smooth: bool,
  pub enable_filter_intra: bool,
  pub dc_only: bool,
}

impl Default for IntraCtrls {
  fn default() -> Self {
    IntraCtrls {
      enabled: true,
      angle_delta_count: 7,
      enable_paeth: true,
      enable_smooth: true,
      enable_filter_intra: true,
      dc_only: false,
    }
  }
}

const ANGLE_DELTAS: [i8; 7] = [0, -1, 1, -2, 2, -MAX_ANGLE_DELTA, MAX_ANGLE_DELTA];

/// Chroma mode for the block's intra candidates: the independent chroma
/// search result when one ran, CFL where legal, DC otherwise. Chroma
/// planes 4 wide or high never take a directional mode.
fn chroma_mode_for<T: Pixel>(
  seq: &SequenceInfo, blk: &BlockCtx<'_, T>,
) -> (PredictionMode, i8) {
  if let Some((mode, angle)) = blk.chroma_cache {
    if mode.is_directional()
      && (blk.geom.width() <= 4 || blk.geom.height() <= 4)
    {
      return (PredictionMode::DC_PRED, 0);
    }
    return (mode, angle);
  }
  if !seq.disable_cfl && blk.geom.bsize.cfl_allowed() {
    (PredictionMode::UV_CFL_PRED, 0)
  } else {
    (PredictionMode::DC_PRED, 0)
  }
}

fn push_intra<T: Pixel>(
  ctx: &mut ModeDecisionContext<T>, luma: PredictionMode,
  chroma: (PredictionMode, i8), angle_delta_y: i8,
) -> bool {
  let mut cand = ModeDecisionCandidate::intra(luma, chroma.0);
  cand.intra.angle_delta_y = angle_delta_y;
  cand.intra.angle_delta_uv = chroma.1;
  ctx.push_candidate(cand)
}

/// The luma intra sweep plus filter intra.
pub fn inject_intra_candidates<T: Pixel>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>,
) {
  let _ = frame;
  if !ctx.intra_ctrls.enabled {
    return;
  }
  let dc_only = ctx.intra_ctrls.dc_only || ctx.elimination.force_dc_only;
  let chroma = chroma_mode_for(seq, blk);

  for &mode in MD_INTRA_MODES {
    if dc_only && mode != PredictionMode::DC_PRED {
      continue;
    }
    if !ctx.intra_ctrls.enable_paeth && mode == PredictionMode::PAETH_PRED {
      continue;
    }
    if !ctx.intra_ctrls.enable_smooth
      && matches!(
        mode,
        PredictionMode::SMOOTH_PRED
          | PredictionMode::SMOOTH_H_PRED
          | PredictionMode::SMOOTH_V_PRED
      )
    {
      continue;
    }
    if mode.is_directional() {
      let deltas =
        &ANGLE_DELTAS[..ctx.intra_ctrls.angle_delta_count.clamp(1, 7)];
      for &delta in deltas {
        push_intra(ctx, mode, chroma, delta);
      }
    } else {
      push_intra(ctx, mode, chroma, 0);
    }
  }

  // Filter intra rides on DC with its own mode tag.
  if seq.enable_filter_intra
    && ctx.intra_ctrls.enable_filter_intra
    && !dc_only
    && blk.geom.width() <= 32
    && blk.geom.height() <= 32
  {
    for fm in FILTER_INTRA_MODES_ALL {
      if !ctx.intra_ctrls.enable_paeth
        && fm == crate::predict::FilterIntraMode::FILTER_PAETH_PRED
      {
        continue;
      }
      let mut cand =
        ModeDecisionCandidate::intra(PredictionMode::DC_PRED, chroma.0);
      cand.intra.angle_delta_uv = chroma.1;
      cand.intra.filter_intra_mode = Some(fm);
      ctx.push_candidate(cand);
    }
  }
}

/// Palette candidates from the external luma palette search,
/// emitted as DC intra candidates carrying the palette.
pub fn inject_palette_candidates<T: Pixel, O: MdOracles<T>>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>, oracles: &O,
) {
  let _ = frame;
  if !seq.enable_palette
    || ctx.intra_ctrls.dc_only
    || ctx.elimination.force_dc_only
  {
    return;
  }
  let (w, h) = (blk.geom.width(), blk.geom.height());
  if !(8..=64).contains(&w) || !(8..=64).contains(&h) {
    return;
  }

  let palettes = oracles.search_palette_luma(
    blk.src,
    blk.src_off,
    blk.geom.bsize,
    PALETTE_CAND_MAX,
  );
  let chroma = chroma_mode_for(seq, blk);
  for palette in palettes {
    if !palette.has_palette_y() {
      continue;
    }
    let mut cand =
      ModeDecisionCandidate::intra(PredictionMode::DC_PRED, chroma.0);
    cand.intra.angle_delta_uv = chroma.1;
    cand.intra.palette = Some(Box::new(palette));
    ctx.push_candidate(cand);
  }
}

/// Display-copy candidates. Each validated DV becomes a DC intra
/// candidate with `use_intrabc` set and the DV in the list-0 MV slot.
pub fn inject_intrabc_candidates<T: Pixel, O: MdOracles<T>>(
  ctx: &mut ModeDecisionContext<T>, seq: &SequenceInfo, frame: &FrameInfo,
  blk: &BlockCtx<'_, T>, oracles: &O,
) {
  if !seq.enable_intrabc || !frame.allow_intrabc {
    return;
  }

  let dvs = search_intrabc_dv(
    oracles,
    &ctx.intrabc_ctrls,
    blk.src,
    blk.src_off,
    blk.mv_stacks,
    &blk.tile,
    blk.geom.mi_row,
    blk.geom.mi_col,
    blk.geom.bsize,
    seq.sb_size,
  );
  if dvs.is_empty() {
    return;
  }
  let dv_ref = select_ref_dv(
    blk.mv_stacks,
    &blk.tile,
    blk.geom.mi_row,
    blk.geom.mi_col,
    seq.sb_size >> 2,
  );

  for dv in dvs {
    let mut cand = ModeDecisionCandidate::intra(
      PredictionMode::DC_PRED,
      PredictionMode::DC_PRED,
    );
    cand.use_intrabc = true;
    cand.mv[0] = dv;
    cand.pred_mv[0] = dv_ref;
    ctx.push_candidate(cand);
  }
}

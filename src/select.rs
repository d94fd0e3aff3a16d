// Copyright (c) 2017-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Final mode selection: scan the scored candidate buffers and commit the
//! winner into the block record.

use crate::buffers::{CandidateBuffer, TuRecord};
use crate::candidate::{InterInterCompound, InterIntra, PredDirection};
use crate::compound::CompoundType;
use crate::frame::WarpedMotionParams;
use crate::mv::MotionVector;
use crate::partition::MAX_TXB_COUNT;
use crate::predict::{
  CflParams, FilterIntraMode, InterpFilters, MotionMode, PaletteInfo,
  PredictionMode,
};
use crate::refs::RefFrames;
use arrayvec::ArrayVec;
use v_frame::pixel::Pixel;

/// Which partitioning-depth pass the caller is in; only the final pass
/// commits the total rate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PdPass {
  Pd0,
  Pd1,
  Pd2,
}

/// The committed per-block mode record, the kernel's durable output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockRecord {
  pub total_rate: u32,
  pub cost: u64,
  pub default_cost: u64,
  pub distortion: u64,
  pub merge_cost: u64,
  pub skip_cost: u64,

  pub is_inter: bool,
  pub pred_mode: PredictionMode,
  pub tx_depth: u8,
  pub skip_flag: bool,
  pub block_has_coeff: bool,
  pub use_intrabc: bool,
  pub skip_mode_allowed: bool,

  pub mv: [MotionVector; 2],
  pub pred_mv: [MotionVector; 2],
  pub drl_index: u8,
  pub ref_frames: RefFrames,
  pub pred_direction: PredDirection,
  pub motion_mode: MotionMode,
  pub num_proj_ref: u8,
  pub interinter_comp: InterInterCompound,
  pub interintra: InterIntra,
  pub interp_filters: InterpFilters,

  pub luma_mode: PredictionMode,
  pub chroma_mode: PredictionMode,
  pub angle_delta_y: i8,
  pub angle_delta_uv: i8,
  pub cfl: CflParams,
  pub filter_intra_mode: Option<FilterIntraMode>,
  pub palette: Option<Box<PaletteInfo>>,

  pub wm_params: [WarpedMotionParams; 2],
  pub tu: ArrayVec<TuRecord, MAX_TXB_COUNT>,
}

/// Dense arena of block records addressed by `blkidx_mds`; child blocks
/// reference parents by index, never by pointer.
#[derive(Clone, Debug, Default)]
pub struct BlockRecordArena {
  records: Vec<BlockRecord>,
}

impl BlockRecordArena {
  pub fn new(block_count: usize) -> Self {
    BlockRecordArena { records: vec![BlockRecord::default(); block_count] }
  }

  #[inline]
  pub fn get(&self, blkidx_mds: usize) -> &BlockRecord {
    &self.records[blkidx_mds]
  }

  #[inline]
  pub fn get_mut(&mut self, blkidx_mds: usize) -> &mut BlockRecord {
    &mut self.records[blkidx_mds]
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.records.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

/// Scans the first `count` entries of the permutation and returns the
/// buffer index with the lowest full cost. Ties keep the earliest
/// permutation position.
///
/// # Panics
///
/// - If `count` is zero or exceeds the permutation length.
pub fn select_best_candidate<T: Pixel>(
  buffers: &[CandidateBuffer<T>], best_candidate_index_array: &[usize],
  count: usize,
) -> usize {
  assert!(count > 0 && count <= best_candidate_index_array.len());

  let mut best = best_candidate_index_array[0];
  let mut best_cost = buffers[best].full_cost;
  for &idx in &best_candidate_index_array[1..count] {
    let cost = buffers[idx].full_cost;
    if cost < best_cost {
      best_cost = cost;
      best = idx;
    }
  }
  best
}

/// Copies the winning candidate and its RD outputs into the block record.
/// Calling this twice with the same winner leaves the record identical.
pub fn commit_winner<T: Pixel>(
  record: &mut BlockRecord, buffer: &CandidateBuffer<T>, pd_pass: PdPass,
) {
  let cand = &buffer.candidate;

  record.total_rate =
    if pd_pass == PdPass::Pd2 { buffer.total_rate } else { 0 };
  record.cost = buffer.full_cost;
  record.default_cost = buffer.default_cost;
  record.distortion = buffer.distortion;
  record.merge_cost = buffer.merge_cost;
  record.skip_cost = buffer.skip_cost;

  record.is_inter = cand.is_inter();
  record.pred_mode = cand.pred_mode;
  record.tx_depth = buffer.tx_depth;
  record.skip_flag = buffer.skip_flag;
  record.block_has_coeff = buffer.block_has_coeff();
  record.use_intrabc = cand.use_intrabc;
  record.skip_mode_allowed = cand.skip_mode_allowed;

  record.mv = cand.mv;
  record.pred_mv = cand.pred_mv;
  record.drl_index = cand.drl_index;
  record.ref_frames = cand.ref_frames;
  record.pred_direction = cand.pred_direction;
  record.motion_mode = cand.motion_mode;
  record.num_proj_ref = cand.num_proj_ref;

  if cand.is_compound() {
    let comp = &cand.compound;
    if comp.comp_type == CompoundType::COMPOUND_AVERAGE
      && (comp.comp_group_idx != 0 || comp.compound_idx != 1)
    {
      log::error!(
        "COMPOUND_AVERAGE winner carries comp_group_idx={} compound_idx={}",
        comp.comp_group_idx,
        comp.compound_idx
      );
    }
  }
  record.interinter_comp = cand.compound;
  record.interintra = cand.interintra;
  record.interp_filters = cand.interp_filters;

  record.luma_mode = cand.intra.luma_mode;
  record.chroma_mode = cand.intra.chroma_mode;
  record.angle_delta_y = cand.intra.angle_delta_y;
  record.angle_delta_uv = cand.intra.angle_delta_uv;
  record.cfl = cand.intra.cfl;
  record.filter_intra_mode = cand.intra.filter_intra_mode;
  record.palette = cand.intra.palette.clone();

  record.wm_params =
    if cand.motion_mode == MotionMode::WARPED_CAUSAL {
      cand.wm_params
    } else {
      [WarpedMotionParams::IDENTITY; 2]
    };

  record.tu.clear();
  record.tu.extend(buffer.tu.iter().copied());
}

// Copyright (c) 2020-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! IntraBC display-vector search: per-direction legal regions, predictor
//! DV derivation and the hardware-delay validity rules.

use crate::mv::MotionVector;
use crate::mvp::RefMvStacks;
use crate::oracle::MdOracles;
use crate::partition::{BlockSize, MI_SIZE};
use crate::refs::RefFrames;
use crate::serialize::{Deserialize, Serialize};
use crate::tile::{MvLimits, TileInfo};
use arrayvec::ArrayVec;
use v_frame::pixel::Pixel;
use v_frame::plane::{Plane, PlaneOffset};

/// Pixels of decode delay between the reconstruction write and the
/// IntraBC read on the same superblock row.
pub const INTRABC_DELAY_PIXELS: isize = 256;
const INTRABC_DELAY_SB64: isize = INTRABC_DELAY_PIXELS / 64;

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct IntraBcCtrls {
  pub enabled: bool,
  /// Also search the leftward region on the current superblock row.
  pub search_left: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IbcDirection {
  Above,
  Left,
}

/// Full-pel limits of the legal IBC region for one search direction,
/// relative to the block position.
pub fn ibc_mv_limits(
  dir: IbcDirection, tile: &TileInfo, mi_row: usize, mi_col: usize,
  bsize: BlockSize, sb_mi_size: usize,
) -> MvLimits {
  let w = bsize.width() as isize;
  let h = bsize.height() as isize;
  let mi_row = mi_row as isize;
  let mi_col = mi_col as isize;
  let sb_mi_size = sb_mi_size as isize;
  let sb_row = (mi_row / sb_mi_size) * sb_mi_size;
  let sb_col = (mi_col / sb_mi_size) * sb_mi_size;
  let mi = MI_SIZE as isize;

  match dir {
    IbcDirection::Above => MvLimits {
      col_min: ((tile.mi_col_start as isize - mi_col) * mi) as i32,
      col_max: ((tile.mi_col_end as isize - mi_col) * mi - w) as i32,
      row_min: ((tile.mi_row_start as isize - mi_row) * mi) as i32,
      row_max: ((sb_row - mi_row) * mi - h) as i32,
    },
    IbcDirection::Left => MvLimits {
      col_min: ((tile.mi_col_start as isize - mi_col) * mi) as i32,
      col_max: ((sb_col - mi_col) * mi - w - INTRABC_DELAY_PIXELS) as i32,
      row_min: ((sb_row - mi_row) * mi) as i32,
      row_max: ((sb_row + sb_mi_size - mi_row) * mi - h) as i32,
    },
  }
}

/// Fallback predictor DV from tile/superblock geometry, used when the
/// block's ref-MV stack holds no usable display vector.
pub fn find_ref_dv(
  tile: &TileInfo, mi_row: usize, mi_col: usize, sb_mi_size: usize,
) -> MotionVector {
  let _ = mi_col;
  let sb_px = (sb_mi_size * MI_SIZE) as isize;
  if (mi_row - tile.mi_row_start) < sb_mi_size {
    // first superblock row of the tile: point left past the delay window
    MotionVector { row: 0, col: (-(sb_px + INTRABC_DELAY_PIXELS) * 8) as i16 }
  } else {
    MotionVector { row: (-sb_px * 8) as i16, col: 0 }
  }
}

/// Predictor DV for the search: the first non-zero of the INTRA stack's
/// nearest/near entries, else the geometric fallback.
pub fn select_ref_dv(
  stacks: &RefMvStacks, tile: &TileInfo, mi_row: usize, mi_col: usize,
  sb_mi_size: usize,
) -> MotionVector {
  let stack = stacks.stack(RefFrames::INTRA);
  for entry in stack.iter().take(2) {
    if !entry.this_mv.is_zero() {
      return entry.this_mv;
    }
  }
  find_ref_dv(tile, mi_row, mi_col, sb_mi_size)
}

/// Validity of a candidate DV: full-pel aligned, source block inside the
/// tile, and the source superblocks already reconstructed (above the
/// current SB row, or past the decode-delay window on the same row).
pub fn is_dv_valid(
  dv: MotionVector, tile: &TileInfo, mi_row: usize, mi_col: usize,
  bsize: BlockSize, sb_size_log2: usize,
) -> bool {
  if !dv.is_fullpel() {
    return false;
  }

  let bw = bsize.width() as isize;
  let bh = bsize.height() as isize;
  let src_top = (mi_row * MI_SIZE) as isize + (dv.row >> 3) as isize;
  let src_left = (mi_col * MI_SIZE) as isize + (dv.col >> 3) as isize;
  let src_bottom = src_top + bh;
  let src_right = src_left + bw;

  if src_top < tile.top_px()
    || src_left < tile.left_px()
    || src_bottom > tile.bottom_px()
    || src_right > tile.right_px()
  {
    return false;
  }

  // The source 64x64 must precede the active one in raster order by the
  // full decode-delay distance.
  let sb_size = 1isize << sb_size_log2;
  let mib_size_log2 = sb_size_log2 - 2;
  let active_sb_row = (mi_row >> mib_size_log2) as isize;
  let active_sb64_col = ((mi_col * MI_SIZE) as isize) >> 6;
  let src_sb_row = (src_bottom - 1) >> sb_size_log2;
  let src_sb64_col = (src_right - 1) >> 6;
  let total_sb64_per_row =
    (((tile.mi_col_end - tile.mi_col_start - 1) >> 4) + 1) as isize;
  let active_sb64 = active_sb_row * total_sb64_per_row + active_sb64_col;
  let src_sb64 = src_sb_row * total_sb64_per_row + src_sb64_col;
  if src_sb64 >= active_sb64 - INTRABC_DELAY_SB64 {
    return false;
  }

  // Wavefront constraint: only the top-left area is referenceable.
  let gradient = 1 + INTRABC_DELAY_SB64 + isize::from(sb_size > 64);
  let wf_offset = gradient * (active_sb_row - src_sb_row);
  if src_sb_row > active_sb_row
    || src_sb64_col >= active_sb64_col - INTRABC_DELAY_SB64 + wf_offset
  {
    return false;
  }

  true
}

/// Up to two display-copy vectors for the block, one per searched
/// direction, each full-pel search seeded with the predictor DV and
/// validated before acceptance.
pub fn search_intrabc_dv<T: Pixel, O: MdOracles<T>>(
  oracles: &O, ctrls: &IntraBcCtrls, src: &Plane<T>, src_off: PlaneOffset,
  stacks: &RefMvStacks, tile: &TileInfo, mi_row: usize, mi_col: usize,
  bsize: BlockSize, sb_size: usize,
) -> ArrayVec<MotionVector, 2> {
  let mut out = ArrayVec::new();
  if !ctrls.enabled {
    return out;
  }

  let sb_mi_size = sb_size >> 2;
  let sb_size_log2 = sb_size.trailing_zeros() as usize;
  let mut directions: ArrayVec<IbcDirection, 2> = ArrayVec::new();
  directions.push(IbcDirection::Above);
  if ctrls.search_left {
    directions.push(IbcDirection::Left);
  }

  for dir in directions {
    let limits = ibc_mv_limits(dir, tile, mi_row, mi_col, bsize, sb_mi_size);
    if limits.is_empty() {
      continue;
    }
    let dv_ref = select_ref_dv(stacks, tile, mi_row, mi_col, sb_mi_size);
    let Some(result) = oracles.full_pixel_search(
      src,
      src_off,
      dv_ref,
      &limits,
      bsize.width(),
      bsize.height(),
    ) else {
      continue;
    };
    let dv = result.mv;
    if !is_dv_valid(dv, tile, mi_row, mi_col, bsize, sb_size_log2) {
      continue;
    }
    if !out.contains(&dv) {
      out.push(dv);
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::partition::BlockSize::*;

  // a 1024x1024 frame-wide tile, 64x64 superblocks
  fn tile() -> TileInfo {
    TileInfo::frame_tile(256, 256)
  }

  #[test]
  fn above_region_stops_at_sb_row() {
    // block at mi (20, 4): second SB row
    let lim = ibc_mv_limits(IbcDirection::Above, &tile(), 20, 4, BLOCK_16X16, 16);
    // rows must end above the current SB row (sb_row mi = 16 -> 64 px)
    assert_eq!(lim.row_max, (64 - 80 - 16) as i32);
    assert!(lim.row_min <= lim.row_max);
  }

  #[test]
  fn left_region_empty_without_delay_distance() {
    // block in the second SB column: less than 256 px to the left
    let lim = ibc_mv_limits(IbcDirection::Left, &tile(), 20, 20, BLOCK_16X16, 16);
    assert!(lim.is_empty());
  }

  #[test]
  fn ref_dv_first_sb_row_points_left() {
    let dv = find_ref_dv(&tile(), 0, 0, 16);
    assert_eq!(dv.row, 0);
    assert_eq!(dv.col as isize, -(64 + INTRABC_DELAY_PIXELS) * 8);
    let dv = find_ref_dv(&tile(), 16, 0, 16);
    assert_eq!(dv.col, 0);
    assert_eq!(dv.row as isize, -64 * 8);
  }

  #[test]
  fn subpel_dv_rejected() {
    let dv = MotionVector::new(-513, 0);
    assert!(!is_dv_valid(dv, &tile(), 16, 16, BLOCK_16X16, 6));
  }

  #[test]
  fn dv_outside_tile_rejected() {
    // block at mi (16,0); dv pointing left out of the tile
    let dv = MotionVector::new(-8 * 8, 0);
    assert!(!is_dv_valid(dv, &tile(), 16, 0, BLOCK_16X16, 6));
  }

  #[test]
  fn dv_above_far_enough_accepted() {
    // block at mi (32, 32): SB row 2; a DV a full SB row up is legal
    let dv = MotionVector::new(0, -64 * 8);
    assert!(is_dv_valid(dv, &tile(), 32, 32, BLOCK_16X16, 6));
  }

  #[test]
  fn dv_into_active_sb_rejected() {
    // zero DV would read the block itself
    let dv = MotionVector::new(0, 0);
    assert!(!is_dv_valid(dv, &tile(), 32, 32, BLOCK_16X16, 6));
  }

  #[test]
  fn ref_dv_selection_prefers_stack() {
    let mut stacks = RefMvStacks::default();
    let tile = tile();
    // empty stack: geometric fallback
    let dv = select_ref_dv(&stacks, &tile, 0, 0, 16);
    assert_eq!(dv, find_ref_dv(&tile, 0, 0, 16));

    use crate::mvp::CandidateMV;
    stacks.set(
      RefFrames::INTRA,
      &[CandidateMV {
        this_mv: MotionVector::new(-128, 0),
        comp_mv: MotionVector::default(),
        weight: 2,
      }],
    );
    let dv = select_ref_dv(&stacks, &tile, 0, 0, 16);
    assert_eq!(dv, MotionVector::new(-128, 0));
  }
}

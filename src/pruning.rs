// Copyright (c) 2020-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Reference-frame pruning: the validity gate every injector consults
//! before touching a reference.

use crate::compound::CompoundType;
use crate::refs::{RefFrames, RefType, REFS_PER_LIST};
use crate::serialize::{Deserialize, Serialize};

pub const TOT_INTER_GROUP: usize = 13;

/// Candidate groups the pruning tables are resolved per. Each injector
/// charges its references to one group; the side searches (inter-intra,
/// warp, OBMC) and the masked compound types have groups of their own.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InterGroup {
  PaMe = 0,
  Uni3x3 = 1,
  Bi3x3 = 2,
  NearestNearNew = 3,
  NearestNear = 4,
  PredMe = 5,
  Global = 6,
  Warp = 7,
  Obmc = 8,
  InterIntra = 9,
  CompDist = 10,
  CompDiff = 11,
  CompWedge = 12,
}

/// Pre-computed per-(group, list, ref) pruning decisions, with the
/// closest-reference override.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct RefPruningCtrls {
  pub enabled: bool,
  /// `do_ref[group][list][ref_idx]`: reference allowed for this group.
  pub do_ref: [[[bool; REFS_PER_LIST]; 2]; TOT_INTER_GROUP],
  /// When set for a group, `ref_idx == 0` survives even if `do_ref`
  /// disables it.
  pub closest_refs: [bool; TOT_INTER_GROUP],
}

impl Default for RefPruningCtrls {
  fn default() -> Self {
    RefPruningCtrls {
      enabled: false,
      do_ref: [[[true; REFS_PER_LIST]; 2]; TOT_INTER_GROUP],
      closest_refs: [true; TOT_INTER_GROUP],
    }
  }
}

impl RefPruningCtrls {
  #[inline]
  pub fn is_valid_ref(
    &self, group: InterGroup, list: usize, ref_idx: usize,
  ) -> bool {
    if !self.enabled {
      return true;
    }
    if self.do_ref[group as usize][list][ref_idx] {
      return true;
    }
    ref_idx == 0 && self.closest_refs[group as usize]
  }

  #[inline]
  pub fn is_valid_ref_type(&self, group: InterGroup, rf: RefType) -> bool {
    self.is_valid_ref(group, rf.list(), rf.ref_idx())
  }

  /// Both sides of a compound pair must pass for the pair to survive.
  #[inline]
  pub fn is_valid_ref_pair(&self, group: InterGroup, rf: RefFrames) -> bool {
    debug_assert!(rf.is_compound());
    self.is_valid_ref_type(group, rf.rf0())
      && self.is_valid_ref_type(group, rf.rf1())
  }

  /// Uni-pred gate for an injector's inter-type index: 0 keeps the
  /// injector's own group, 1-2 are the inter-intra variants, 3 warp,
  /// 4 OBMC.
  pub fn is_valid_uni_type(
    &self, inter_type: usize, origin: InterGroup, list: usize, ref_idx: usize,
  ) -> bool {
    let group = match inter_type {
      0 => origin,
      1 | 2 => InterGroup::InterIntra,
      3 => InterGroup::Warp,
      4 => InterGroup::Obmc,
      _ => panic!("unknown uni inter-type {inter_type}"),
    };
    self.is_valid_ref(group, list, ref_idx)
  }

  /// Bi-pred gate per compound type. AVG passes unconditionally; the
  /// masked and distance-weighted types consult their pruning group.
  pub fn is_valid_bi_type(
    &self, ctype: CompoundType, rf: RefFrames,
  ) -> bool {
    let group = match ctype {
      CompoundType::COMPOUND_AVERAGE => return true,
      CompoundType::COMPOUND_DISTWTD => InterGroup::CompDist,
      CompoundType::COMPOUND_DIFFWTD => InterGroup::CompDiff,
      CompoundType::COMPOUND_WEDGE => InterGroup::CompWedge,
    };
    self.is_valid_ref_pair(group, rf)
  }
}

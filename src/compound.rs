// Copyright (c) 2019-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Compound-prediction type policy for bi-pred candidates.

#![allow(non_camel_case_types)]

use crate::frame::{FrameInfo, SkipModeParams};
use crate::refs::RefFrames;
use crate::serialize::{Deserialize, Serialize};
use arrayvec::ArrayVec;

pub const COMPOUND_TYPES: usize = 4;
pub const MAX_WEDGE_TYPES: usize = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum CompoundType {
  #[default]
  COMPOUND_AVERAGE = 0,
  COMPOUND_DISTWTD,
  COMPOUND_DIFFWTD,
  COMPOUND_WEDGE,
}

impl CompoundType {
  /// Masked types need the external mask-fit search before emission.
  #[inline]
  pub fn is_masked(self) -> bool {
    matches!(
      self,
      CompoundType::COMPOUND_DIFFWTD | CompoundType::COMPOUND_WEDGE
    )
  }

  /// `(comp_group_idx, compound_idx)` as signalled for this type.
  /// COMPOUND_AVERAGE must always be (0, 1).
  #[inline]
  pub const fn group_and_index(self) -> (u8, u8) {
    match self {
      CompoundType::COMPOUND_AVERAGE => (0, 1),
      CompoundType::COMPOUND_DISTWTD => (0, 0),
      CompoundType::COMPOUND_DIFFWTD | CompoundType::COMPOUND_WEDGE => (1, 1),
    }
  }
}

pub const ALL_COMPOUND_TYPES: [CompoundType; COMPOUND_TYPES] = [
  CompoundType::COMPOUND_AVERAGE,
  CompoundType::COMPOUND_DISTWTD,
  CompoundType::COMPOUND_DIFFWTD,
  CompoundType::COMPOUND_WEDGE,
];

/// Which compound types the encoder preset lets MD search.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct InterCompoundCtrls {
  pub allow_avg: bool,
  pub allow_dist: bool,
  pub allow_diff: bool,
  pub allow_wedge: bool,
}

impl Default for InterCompoundCtrls {
  fn default() -> Self {
    InterCompoundCtrls {
      allow_avg: true,
      allow_dist: true,
      allow_diff: false,
      allow_wedge: false,
    }
  }
}

impl InterCompoundCtrls {
  #[inline]
  pub fn allows(&self, ctype: CompoundType) -> bool {
    match ctype {
      CompoundType::COMPOUND_AVERAGE => self.allow_avg,
      CompoundType::COMPOUND_DISTWTD => self.allow_dist,
      CompoundType::COMPOUND_DIFFWTD => self.allow_diff,
      CompoundType::COMPOUND_WEDGE => self.allow_wedge,
    }
  }
}

/// Whether `rf` is exactly the frame's skip-mode reference pair.
#[inline]
pub fn matches_skip_mode_refs(skip: &SkipModeParams, rf: RefFrames) -> bool {
  skip.skip_mode_allowed && rf.rf0() == skip.ref0 && rf.rf1() == skip.ref1
}

/// The ordered list of compound types a bi-pred MV pair should be emitted
/// with. `bi_gate` is the validity-gate predicate for non-AVG types
/// (tile and ref pruning). When the pair matches the frame's skip-mode references,
/// AVG is forced into the list even if `ctrls` disables it; the caller
/// marks that AVG candidate `skip_mode_allowed`.
pub fn compound_types_to_search<F>(
  ctrls: &InterCompoundCtrls, frame: &FrameInfo, rf: RefFrames, bi_gate: F,
) -> ArrayVec<CompoundType, COMPOUND_TYPES>
where
  F: Fn(CompoundType) -> bool,
{
  let mut out = ArrayVec::new();
  let skip_mode_match = matches_skip_mode_refs(&frame.skip_mode, rf);
  for ctype in ALL_COMPOUND_TYPES {
    let allowed = ctrls.allows(ctype)
      || (ctype == CompoundType::COMPOUND_AVERAGE && skip_mode_match);
    if allowed && bi_gate(ctype) {
      out.push(ctype);
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::FrameInfo;
  use crate::refs::RefType::*;

  fn b_frame_with_skip(rf: RefFrames) -> FrameInfo {
    FrameInfo {
      skip_mode: SkipModeParams {
        skip_mode_allowed: true,
        ref0: rf.rf0(),
        ref1: rf.rf1(),
      },
      ..Default::default()
    }
  }

  #[test]
  fn average_contract_values() {
    assert_eq!(CompoundType::COMPOUND_AVERAGE.group_and_index(), (0, 1));
    assert!(!CompoundType::COMPOUND_AVERAGE.is_masked());
    assert!(CompoundType::COMPOUND_WEDGE.is_masked());
  }

  #[test]
  fn default_ctrls_avg_dist_only() {
    let ctrls = InterCompoundCtrls::default();
    let types = compound_types_to_search(
      &ctrls,
      &FrameInfo::default(),
      RefFrames::pair(LAST_FRAME, BWDREF_FRAME),
      |_| true,
    );
    assert_eq!(
      types.as_slice(),
      &[CompoundType::COMPOUND_AVERAGE, CompoundType::COMPOUND_DISTWTD]
    );
  }

  #[test]
  fn skip_mode_forces_average() {
    let rf = RefFrames::pair(LAST_FRAME, BWDREF_FRAME);
    let ctrls = InterCompoundCtrls {
      allow_avg: false,
      allow_dist: true,
      allow_diff: false,
      allow_wedge: false,
    };
    let frame = b_frame_with_skip(rf);
    let types = compound_types_to_search(&ctrls, &frame, rf, |_| true);
    assert!(types.contains(&CompoundType::COMPOUND_AVERAGE));

    // different pair: AVG stays disabled
    let other = RefFrames::pair(LAST2_FRAME, BWDREF_FRAME);
    let types = compound_types_to_search(&ctrls, &frame, other, |_| true);
    assert!(!types.contains(&CompoundType::COMPOUND_AVERAGE));
  }

  #[test]
  fn gate_filters_non_avg_types() {
    let ctrls = InterCompoundCtrls {
      allow_avg: true,
      allow_dist: true,
      allow_diff: true,
      allow_wedge: true,
    };
    let types = compound_types_to_search(
      &ctrls,
      &FrameInfo::default(),
      RefFrames::pair(LAST_FRAME, BWDREF_FRAME),
      |t| t == CompoundType::COMPOUND_AVERAGE,
    );
    assert_eq!(types.as_slice(), &[CompoundType::COMPOUND_AVERAGE]);
  }
}

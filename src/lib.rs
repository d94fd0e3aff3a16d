// Copyright (c) 2017-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Block-level mode-decision kernel for an AV1-style encoder.
//!
//! Given one coding block, the results of the motion-estimation passes and
//! the frame-level reference metadata, this crate enumerates a bounded set
//! of prediction candidates (intra, inter, compound, warped, OBMC,
//! inter-intra, intra block copy, palette, filter intra), prunes and
//! de-duplicates them, and commits the lowest-RD-cost survivor to the
//! block record. The transform pipeline, the RD cost functions and the
//! search primitives are external collaborators reached through the
//! [`oracle::MdOracles`] seam.

#![allow(clippy::too_many_arguments)]

pub mod buffers;
pub mod candidate;
pub mod classify;
pub mod compound;
pub mod error;
pub mod frame;
pub mod inject;
pub mod interintra;
pub mod intrabc;
pub mod md;
pub mod mv;
pub mod mvp;
pub mod obmc;
pub mod oracle;
pub mod partition;
pub mod predict;
pub mod pruning;
pub mod rate;
pub mod refs;
pub mod select;
mod serialize;
pub mod tile;

pub use crate::candidate::{
  CandidateClass, ModeDecisionCandidate, MODE_DECISION_CANDIDATE_MAX_COUNT,
};
pub use crate::error::MdError;
pub use crate::md::ModeDecisionContext;
pub use crate::mv::{MotionVector, INVALID_MV};
pub use crate::refs::{RefFrames, RefType};
pub use crate::select::{select_best_candidate, BlockRecord};

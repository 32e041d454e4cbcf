// SPDX-License-Identifier: MIT

//! Participant inclusion/exclusion rules for recruitment lists

pub mod criteria;

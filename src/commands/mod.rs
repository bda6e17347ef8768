// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cards;
pub mod purchases;
pub mod expenses;
pub mod income;
pub mod dashboard;
pub mod scan;
pub mod config;
pub mod doctor;

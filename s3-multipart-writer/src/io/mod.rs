/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Request body type
mod aggregated_bytes;
pub(crate) mod part_accumulator;

// re-exports
pub use self::aggregated_bytes::AggregatedBytes;

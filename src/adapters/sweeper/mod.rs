//! Background tasks.

mod expiry_sweeper;

pub use expiry_sweeper::{
    ExpirySweeper, ExpirySweeperConfig, SweeperHandle, SweeperStats, DEFAULT_CHECK_PERIOD,
};

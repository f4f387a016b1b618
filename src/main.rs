use tiletb::model::AdderTile;
use tiletb::prelude::*;
use tiletb::scenarios::{
    test_enable_toggle, test_random_soak, test_reset, test_reset_after_activity,
};

// Specify tests to be executed
tiletb::run_with_model!(
    AdderTile::default();
    test_reset,
    test_reset_after_activity,
    test_enable_toggle,
    test_random_soak,
);

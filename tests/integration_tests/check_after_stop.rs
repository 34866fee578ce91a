// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::integration_tests::common;

#[test]
#[ignore]
fn check_after_stop_raises() {
    let client = common::client(1).expect("construct client against a reachable server");
    client.close().expect("close should succeed");
    let result = client.check();
    assert!(result.is_err(), "check() after close() must raise");
}

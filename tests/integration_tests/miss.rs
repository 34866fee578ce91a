// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::integration_tests::common;

#[test]
#[ignore]
fn miss_returns_absent_not_an_error() {
    let client = common::client(2).expect("construct client against a reachable server");
    let value = client.get("doesntexist").expect("a miss is not an error");
    assert!(value.is_none());
    client.close().expect("close should succeed");
}

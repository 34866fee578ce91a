// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serial_test::serial;

use crate::integration_tests::common;

#[test]
#[ignore]
#[serial(foo_key)]
fn warm_up_set_get_close() {
    let client = common::client(5).expect("construct client against a reachable server");

    client.set("foo", "bar", 0, true).expect("set should succeed");
    let value = client.get("foo").expect("get should succeed");
    assert_eq!(value.as_deref(), Some(&b"bar"[..]));

    client.close().expect("first close should succeed");
    client.close().expect("second close should be a no-op");
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{thread::sleep, time::Duration};

use serial_test::serial;

use crate::integration_tests::common;

#[test]
#[ignore]
#[serial(foo_key)]
fn value_is_absent_after_its_expiration() {
    let client = common::client(2).expect("construct client against a reachable server");

    client.set("foo", "bar", 1, true).expect("set with a 1s expiration should succeed");
    sleep(Duration::from_secs(2));
    let value = client.get("foo").expect("get after expiration should not error");
    assert!(value.is_none());

    client.close().expect("close should succeed");
}

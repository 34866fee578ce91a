// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use crate::integration_tests::common;

#[test]
#[ignore]
fn two_concurrent_sets_share_one_connection_without_loss_or_deadlock() {
    let client = Arc::new(common::client(1).expect("construct client against a reachable server"));

    let a = {
        let client = Arc::clone(&client);
        std::thread::spawn(move || client.set("pool-a", "one", 0, true))
    };
    let b = {
        let client = Arc::clone(&client);
        std::thread::spawn(move || client.set("pool-b", "two", 0, true))
    };

    a.join().expect("thread a should not panic").expect("set a should succeed");
    b.join().expect("thread b should not panic").expect("set b should succeed");

    assert_eq!(client.get("pool-a").unwrap().as_deref(), Some(&b"one"[..]));
    assert_eq!(client.get("pool-b").unwrap().as_deref(), Some(&b"two"[..]));

    client.close().expect("close should succeed");
}

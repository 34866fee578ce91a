// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use memcache_loop_rs::Client;

#[test]
#[ignore]
fn construction_against_an_unreachable_host_fails_and_leaves_no_thread_running() {
    let result = Client::new("memcache-loop-rs.invalid.test", 11211, 1, false);
    assert!(result.is_err(), "construction against an unresolvable host must fail");
}

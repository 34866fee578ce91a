// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use memcache_loop_rs::Client;

#[test]
#[ignore]
fn construction_against_a_refused_port_fails() {
    // Port 9 (discard) is conventionally closed on a loopback test host; any
    // closed local port works equally well as long as nothing listens there.
    let result = Client::new("127.0.0.1", 9, 1, false);
    assert!(result.is_err(), "construction against a refused port must fail");
}

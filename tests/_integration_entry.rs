// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

#![allow(clippy::all)]

mod integration_tests {
    pub mod common;

    pub mod check_after_stop;
    pub mod expiration;
    pub mod miss;
    pub mod pool_saturation;
    pub mod refused_port;
    pub mod unreachable_host;
    pub mod warm_up_set_get_close;
}

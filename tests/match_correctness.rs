// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Property 4 (spec §8): "a rule with trigger `(a, e, m)` fires on a write
//! of value `v` to `a` iff `(v & m) == (e & m)`. Quantified over all `v`."

use std::sync::{Arc, Mutex};

use device_sim::core::handle::{DeviceHandle, KindId};
use device_sim::core::manager::DeviceManager;
use device_sim::core::rule::{ActionTarget, CallbackEnvelope, Trigger};
use device_sim::devices;
use proptest::prelude::*;

proptest! {
    #[test]
    fn rule_fires_iff_masked_value_matches(expected: u32, mask: u32, value: u32) {
        let mut manager = DeviceManager::new();
        devices::register_builtin_kinds(&mut manager).unwrap();
        manager.create_device(KindId::Fpga, 0).unwrap();
        let h = DeviceHandle::new(KindId::Fpga, 0);

        let fired: Arc<Mutex<bool>> = Arc::new(Mutex::new(false));
        let fired_cb = fired.clone();
        manager
            .install_rule(
                h,
                Trigger::new(0x20, expected, mask),
                vec![ActionTarget::Callback {
                    callback: Arc::new(move |_env: CallbackEnvelope| {
                        *fired_cb.lock().unwrap() = true;
                    }),
                    user_data: 0,
                    handle: h,
                    addr: 0x20,
                    value,
                }],
                0,
                "prop-match",
            )
            .unwrap();

        manager.write_word(h, 0x20, value).unwrap();

        let expected_fire = (value & mask) == (expected & mask);
        prop_assert_eq!(*fired.lock().unwrap(), expected_fire);
    }
}

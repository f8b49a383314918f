// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::types::Route;
use itertools::Itertools;

/// Reduce a set of equally-specific candidate routes to the single best one.
///
/// The rules apply in order, each narrowing the candidate set:
///
/// 1. Highest local preference.
/// 2. Routes this router originated, when any exist.
/// 3. Shortest AS path.
/// 4. Best origin class, IGP over EGP over unknown.
/// 5. Lowest peer address, which is unique among remaining candidates.
pub fn select<'a>(candidates: Vec<&'a Route>) -> Option<&'a Route> {
    if candidates.is_empty() {
        return None;
    }

    // Filter down to paths with the highest local preference.
    let candidates = candidates.into_iter().max_set_by_key(|x| x.local_pref);

    // Partition the choice space on whether routes are self-originated. If
    // any are, only those remain in play.
    let (self_originated, learned): (Vec<&Route>, Vec<&Route>) =
        candidates.into_iter().partition(|x| x.self_origin);
    let candidates = match self_originated.len() {
        0 => learned,
        _ => self_originated,
    };

    // Filter down to paths with the shortest AS path.
    let candidates = candidates.into_iter().min_set_by_key(|x| x.as_path.len());

    // Filter down to paths in the best origin class.
    let candidates = candidates.into_iter().max_set_by_key(|x| x.origin);

    // The lowest peer address disambiguates whatever remains.
    candidates.into_iter().min_by_key(|x| u32::from(x.peer))
}

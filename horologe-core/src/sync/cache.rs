//! Value sync cache
//!
//! Holds the last known value of every synced key as one encoded
//! dictionary in a fixed buffer. Inbound dictionaries are merged into a
//! scratch buffer and swapped in only when the whole merge succeeds, so a
//! failed update leaves every cached value untouched.

use horologe_protocol::{Dictionary, DictionaryResult, DictionaryWriter, Tuple, Tuplet};

/// One key whose value changed during a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TupleChange<'a> {
    pub key: u32,
    pub new: Tuple<'a>,
    pub old: Tuple<'a>,
}

/// Double-buffered key/value cache of `N` encoded bytes
#[derive(Debug, Clone)]
pub struct SyncCache<const N: usize> {
    current: [u8; N],
    current_len: usize,
    previous: [u8; N],
    previous_len: usize,
}

impl<const N: usize> SyncCache<N> {
    /// Seed the cache with initial values
    ///
    /// Only keys seeded here are ever tracked. Fails with
    /// `NotEnoughStorage` if the values do not fit in `N` bytes and with
    /// `InvalidArgs` if a key appears twice.
    pub fn new(initial: &[Tuplet<'_>]) -> Result<Self, DictionaryResult> {
        for (i, tuplet) in initial.iter().enumerate() {
            if initial[..i].iter().any(|t| t.key == tuplet.key) {
                return Err(DictionaryResult::InvalidArgs);
            }
        }

        let mut current = [0u8; N];
        let mut writer = DictionaryWriter::new(&mut current)?;
        for tuplet in initial {
            writer.write_tuplet(tuplet)?;
        }
        let current_len = writer.end();

        Ok(Self {
            current,
            current_len,
            previous: [0u8; N],
            previous_len: 0,
        })
    }

    /// Buffer capacity in bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Encoded size of the cached dictionary
    pub fn len(&self) -> usize {
        self.current_len
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary().map_or(true, |d| d.is_empty())
    }

    /// The cached dictionary as encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.current[..self.current_len]
    }

    fn dictionary(&self) -> Option<Dictionary<'_>> {
        Dictionary::parse(self.as_bytes()).ok()
    }

    /// Cached value for `key`
    pub fn get(&self, key: u32) -> Option<Tuple<'_>> {
        self.dictionary()?.find(key)
    }

    /// Visit every cached tuple in order
    pub fn for_each<F: FnMut(Tuple<'_>)>(&self, mut f: F) {
        if let Some(dictionary) = self.dictionary() {
            for tuple in &dictionary {
                f(tuple);
            }
        }
    }

    /// Merge an inbound dictionary
    ///
    /// Keys not already cached are ignored. On success `on_change` runs
    /// once per changed key, in cache order, and the number of changed
    /// keys is returned. On error nothing is modified and `on_change` is
    /// never called.
    pub fn apply<F>(&mut self, inbound: &Dictionary<'_>, mut on_change: F) -> Result<usize, DictionaryResult>
    where
        F: FnMut(TupleChange<'_>),
    {
        let merged_len = {
            let current = Dictionary::parse(&self.current[..self.current_len])
                .map_err(|_| DictionaryResult::InternalInconsistency)?;
            let mut writer = DictionaryWriter::new(&mut self.previous)?;
            for cached in &current {
                match inbound.find(cached.key) {
                    Some(update) => writer.write_tuple(&update)?,
                    None => writer.write_tuple(&cached)?,
                }
            }
            writer.end()
        };

        for tuple in inbound {
            if !self.contains_key(tuple.key) {
                debug!("sync cache: ignoring key {}", tuple.key);
            }
        }

        // Merged dictionary becomes current, the old one is kept for diffing
        core::mem::swap(&mut self.current, &mut self.previous);
        self.previous_len = self.current_len;
        self.current_len = merged_len;

        let new = Dictionary::parse(&self.current[..self.current_len])
            .map_err(|_| DictionaryResult::InternalInconsistency)?;
        let old = Dictionary::parse(&self.previous[..self.previous_len])
            .map_err(|_| DictionaryResult::InternalInconsistency)?;

        let mut changed = 0;
        for (new, old) in new.iter().zip(old.iter()) {
            if !new.same_value(&old) {
                changed += 1;
                on_change(TupleChange {
                    key: new.key,
                    new,
                    old,
                });
            }
        }
        Ok(changed)
    }

    pub fn contains_key(&self, key: u32) -> bool {
        self.get(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horologe_protocol::IntWidth;
    use proptest::prelude::*;

    const TEMPERATURE: u32 = 1;
    const CONDITION: u32 = 2;

    fn encode(buf: &mut [u8], f: impl FnOnce(&mut DictionaryWriter<'_>)) -> usize {
        let mut writer = DictionaryWriter::new(buf).unwrap();
        f(&mut writer);
        writer.end()
    }

    #[test]
    fn test_initial_values() {
        let cache: SyncCache<64> = SyncCache::new(&[Tuplet::cstring(TEMPERATURE, "1234°C")]).unwrap();
        assert_eq!(cache.get(TEMPERATURE).unwrap().as_cstr(), Some("1234°C"));
        assert!(cache.get(CONDITION).is_none());
        assert_eq!(cache.capacity(), 64);
        assert_eq!(cache.len(), 1 + 7 + 8);
    }

    #[test]
    fn test_initial_values_must_fit() {
        let result: Result<SyncCache<16>, _> =
            SyncCache::new(&[Tuplet::cstring(TEMPERATURE, "far too long for sixteen")]);
        assert_eq!(result.err(), Some(DictionaryResult::NotEnoughStorage));
    }

    #[test]
    fn test_duplicate_initial_key() {
        let result: Result<SyncCache<64>, _> =
            SyncCache::new(&[Tuplet::int(TEMPERATURE, 1), Tuplet::int(TEMPERATURE, 2)]);
        assert_eq!(result.err(), Some(DictionaryResult::InvalidArgs));
    }

    #[test]
    fn test_apply_reports_change() {
        let mut cache: SyncCache<64> = SyncCache::new(&[Tuplet::cstring(TEMPERATURE, "1234°C")]).unwrap();

        let mut buf = [0u8; 32];
        let len = encode(&mut buf, |w| w.write_cstring(TEMPERATURE, "21°C").unwrap());
        let inbound = Dictionary::parse(&buf[..len]).unwrap();

        let mut seen = Vec::new();
        let changed = cache
            .apply(&inbound, |change| {
                seen.push((
                    change.key,
                    change.new.as_cstr().map(String::from),
                    change.old.as_cstr().map(String::from),
                ));
            })
            .unwrap();

        assert_eq!(changed, 1);
        assert_eq!(
            seen,
            vec![(TEMPERATURE, Some("21°C".to_string()), Some("1234°C".to_string()))]
        );
        assert_eq!(cache.get(TEMPERATURE).unwrap().as_cstr(), Some("21°C"));
    }

    #[test]
    fn test_same_value_is_not_a_change() {
        let mut cache: SyncCache<64> = SyncCache::new(&[Tuplet::cstring(TEMPERATURE, "21°C")]).unwrap();
        let mut buf = [0u8; 32];
        let len = encode(&mut buf, |w| w.write_cstring(TEMPERATURE, "21°C").unwrap());
        let inbound = Dictionary::parse(&buf[..len]).unwrap();

        let mut calls = 0;
        assert_eq!(cache.apply(&inbound, |_| calls += 1), Ok(0));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut cache: SyncCache<64> = SyncCache::new(&[Tuplet::cstring(TEMPERATURE, "1°C")]).unwrap();
        let mut buf = [0u8; 32];
        let len = encode(&mut buf, |w| w.write_int(99, 5, IntWidth::Four).unwrap());
        let inbound = Dictionary::parse(&buf[..len]).unwrap();

        assert_eq!(cache.apply(&inbound, |_| panic!("no change expected")), Ok(0));
        assert!(cache.get(99).is_none());
        assert_eq!(cache.get(TEMPERATURE).unwrap().as_cstr(), Some("1°C"));
    }

    #[test]
    fn test_overflow_leaves_cache_untouched() {
        let mut cache: SyncCache<24> = SyncCache::new(&[Tuplet::cstring(TEMPERATURE, "1°C")]).unwrap();
        let before = cache.as_bytes().to_vec();

        let mut buf = [0u8; 64];
        let len = encode(&mut buf, |w| {
            w.write_cstring(TEMPERATURE, "a value much longer than the cache").unwrap()
        });
        let inbound = Dictionary::parse(&buf[..len]).unwrap();

        let result = cache.apply(&inbound, |_| panic!("no change expected"));
        assert_eq!(result, Err(DictionaryResult::NotEnoughStorage));
        assert_eq!(cache.as_bytes(), before.as_slice());
    }

    #[test]
    fn test_type_change_is_a_change() {
        let mut cache: SyncCache<64> = SyncCache::new(&[Tuplet::int(CONDITION, 3)]).unwrap();
        let mut buf = [0u8; 32];
        let len = encode(&mut buf, |w| w.write_cstring(CONDITION, "rain").unwrap());
        let inbound = Dictionary::parse(&buf[..len]).unwrap();

        assert_eq!(cache.apply(&inbound, |_| {}), Ok(1));
        assert_eq!(cache.get(CONDITION).unwrap().as_cstr(), Some("rain"));
    }

    #[test]
    fn test_for_each_in_order() {
        let cache: SyncCache<64> =
            SyncCache::new(&[Tuplet::cstring(TEMPERATURE, "x"), Tuplet::uint(CONDITION, 7)]).unwrap();
        let mut keys = Vec::new();
        cache.for_each(|t| keys.push(t.key));
        assert_eq!(keys, vec![TEMPERATURE, CONDITION]);
    }

    proptest! {
        #[test]
        fn prop_update_is_key_scoped(
            text in "[a-zA-Z0-9 ]{0,10}",
            condition in any::<i32>(),
            update in any::<i32>(),
        ) {
            let mut cache: SyncCache<64> = SyncCache::new(&[
                Tuplet::cstring(TEMPERATURE, &text),
                Tuplet::int(CONDITION, condition),
            ]).unwrap();

            let mut buf = [0u8; 16];
            let len = encode(&mut buf, |w| w.write_int(CONDITION, update, IntWidth::Four).unwrap());
            let inbound = Dictionary::parse(&buf[..len]).unwrap();

            cache.apply(&inbound, |change| assert_eq!(change.key, CONDITION)).unwrap();
            prop_assert_eq!(cache.get(TEMPERATURE).unwrap().as_cstr(), Some(text.as_str()));
            prop_assert_eq!(cache.get(CONDITION).unwrap().as_i32(), Some(update));
        }

        #[test]
        fn prop_failed_merge_changes_nothing(text in "[a-z]{20,40}") {
            let mut cache: SyncCache<20> =
                SyncCache::new(&[Tuplet::cstring(TEMPERATURE, "0")]).unwrap();
            let before = cache.as_bytes().to_vec();

            let mut buf = [0u8; 64];
            let len = encode(&mut buf, |w| w.write_cstring(TEMPERATURE, &text).unwrap());
            let inbound = Dictionary::parse(&buf[..len]).unwrap();

            let result = cache.apply(&inbound, |_| {});
            prop_assert!(result.is_err());
            prop_assert_eq!(cache.as_bytes(), before.as_slice());
        }
    }
}

// The set store
//
// Lock discipline: every public method first takes the key guard for all the
// keys it names, then works on the map. The `*_locked` helpers assume the
// caller already holds the guard. Map references are never held two at a
// time, so the map's own shard locks never nest.

use super::error::{Result, StoreError};
use super::locks::{KeyLocks, DEFAULT_STRIPES};
use super::types::{SetValue, Value};
use bytes::Bytes;
use dashmap::DashMap;
use tracing::debug;

const INTERCARD_BATCH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    Intersect,
    Difference,
}

impl SetOp {
    fn name(self) -> &'static str {
        match self {
            SetOp::Union => "sunion",
            SetOp::Intersect => "sinter",
            SetOp::Difference => "sdiff",
        }
    }
}

pub struct SetStore {
    data: DashMap<Bytes, Value>,
    locks: KeyLocks,
}

impl SetStore {
    pub fn new() -> Self {
        Self::with_stripes(DEFAULT_STRIPES)
    }

    pub fn with_stripes(stripes: usize) -> Self {
        Self {
            data: DashMap::new(),
            locks: KeyLocks::new(stripes),
        }
    }

    // ---- key space ----

    /// Number of keys, of any type.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn exists(&self, key: impl AsRef<[u8]>) -> bool {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        self.data.contains_key(key)
    }

    pub fn key_type(&self, key: impl AsRef<[u8]>) -> Option<&'static str> {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        self.data.get(key).map(|entry| entry.value().type_name())
    }

    /// Place a value at `key`, replacing whatever was there. An empty set
    /// deletes the key instead.
    pub fn put(&self, key: impl AsRef<[u8]>, value: Value) {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        self.store_locked(key, value);
    }

    pub fn get_value(&self, key: impl AsRef<[u8]>) -> Option<Value> {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        self.data.get(key).map(|entry| entry.value().clone())
    }

    /// Delete keys of any type; returns how many existed.
    pub fn del<K: AsRef<[u8]>>(&self, keys: &[K]) -> usize {
        let _guard = self.locks.lock(keys);
        let mut removed = 0;
        for key in keys {
            let key: &[u8] = key.as_ref();
            if self.data.remove(key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    pub fn flush(&self) {
        let _guard = self.locks.lock_all();
        self.data.clear();
    }

    // ---- mutations ----

    /// Returns the number of members that were not already present.
    pub fn sadd<K, I>(&self, key: K, members: I) -> Result<usize>
    where
        K: AsRef<[u8]>,
        I: IntoIterator,
        I::Item: Into<Bytes>,
    {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        self.add_locked(key, members.into_iter().map(Into::into))
    }

    /// Returns the number of members removed. Drained sets are deleted.
    pub fn srem<K, I>(&self, key: K, members: I) -> Result<usize>
    where
        K: AsRef<[u8]>,
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        let removed = self.write_set_locked(key, |set| {
            members
                .into_iter()
                .filter(|m| set.remove(m.as_ref()))
                .count()
        })?;
        Ok(removed.unwrap_or(0))
    }

    /// Move `member` from `source` to `destination` as one step.
    ///
    /// Both keys are type-checked before anything changes. Returns false if
    /// the source does not hold the member.
    pub fn smove(
        &self,
        source: impl AsRef<[u8]>,
        destination: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<bool> {
        let (source, destination, member) = (source.as_ref(), destination.as_ref(), member.as_ref());
        let _guard = self.locks.lock([source, destination]);

        let in_source = self.read_set_locked(source, |set| set.contains(member))?;
        self.read_set_locked(destination, |_| ())?;

        if in_source != Some(true) {
            return Ok(false);
        }
        if source == destination {
            return Ok(true);
        }

        self.write_set_locked(source, |set| set.remove(member))?;
        self.add_locked(destination, std::iter::once(Bytes::copy_from_slice(member)))?;
        debug!(member_len = member.len(), "smove committed");
        Ok(true)
    }

    /// Remove and return one random member.
    pub fn spop(&self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        let popped = self.write_set_locked(key, |set| set.pop_random(&mut rand::thread_rng()))?;
        Ok(popped.flatten())
    }

    /// Remove and return up to `count` distinct random members.
    pub fn spop_count(&self, key: impl AsRef<[u8]>, count: usize) -> Result<Vec<Bytes>> {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        if count == 0 {
            self.read_set_locked(key, |_| ())?;
            return Ok(Vec::new());
        }
        let popped = self.write_set_locked(key, |set| set.pop_many(&mut rand::thread_rng(), count))?;
        Ok(popped.unwrap_or_default())
    }

    pub fn sunionstore<K: AsRef<[u8]>>(&self, destination: impl AsRef<[u8]>, keys: &[K]) -> Result<usize> {
        self.store_op(SetOp::Union, destination.as_ref(), keys)
    }

    pub fn sinterstore<K: AsRef<[u8]>>(&self, destination: impl AsRef<[u8]>, keys: &[K]) -> Result<usize> {
        self.store_op(SetOp::Intersect, destination.as_ref(), keys)
    }

    pub fn sdiffstore<K: AsRef<[u8]>>(&self, destination: impl AsRef<[u8]>, keys: &[K]) -> Result<usize> {
        self.store_op(SetOp::Difference, destination.as_ref(), keys)
    }

    fn store_op<K: AsRef<[u8]>>(&self, op: SetOp, destination: &[u8], keys: &[K]) -> Result<usize> {
        require_keys(op.name(), keys)?;
        let mut locked: Vec<&[u8]> = Vec::with_capacity(keys.len() + 1);
        for key in keys {
            locked.push(key.as_ref());
        }
        locked.push(destination);
        let _guard = self.locks.lock(locked);

        let result = self.compute_locked(op, keys)?;
        let stored = result.len();
        self.store_locked(destination, Value::Set(result));
        debug!(op = op.name(), sources = keys.len(), stored, "stored set result");
        Ok(stored)
    }

    // ---- reads ----

    pub fn scard(&self, key: impl AsRef<[u8]>) -> Result<usize> {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        Ok(self.read_set_locked(key, SetValue::len)?.unwrap_or(0))
    }

    pub fn smembers(&self, key: impl AsRef<[u8]>) -> Result<Vec<Bytes>> {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        let members = self.read_set_locked(key, |set| set.iter().cloned().collect::<Vec<_>>())?;
        Ok(members.unwrap_or_default())
    }

    pub fn sismember(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Result<bool> {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        let found = self.read_set_locked(key, |set| set.contains(member.as_ref()))?;
        Ok(found.unwrap_or(false))
    }

    /// One flag per requested member, in request order.
    pub fn smismember<M: AsRef<[u8]>>(&self, key: impl AsRef<[u8]>, members: &[M]) -> Result<Vec<bool>> {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        let flags = self.read_set_locked(key, |set| {
            members.iter().map(|m| set.contains(m.as_ref())).collect::<Vec<_>>()
        })?;
        Ok(flags.unwrap_or_else(|| vec![false; members.len()]))
    }

    /// One random member, left in place.
    pub fn srandmember(&self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        let picked = self.read_set_locked(key, |set| set.random_member(&mut rand::thread_rng()).cloned())?;
        Ok(picked.flatten())
    }

    /// A non-negative `count` returns up to `count` distinct members. A
    /// negative `count` returns exactly `|count|` draws that may repeat.
    /// `i64::MIN` has no magnitude in range and is rejected.
    pub fn srandmember_count(&self, key: impl AsRef<[u8]>, count: i64) -> Result<Vec<Bytes>> {
        if count == i64::MIN {
            return Err(StoreError::InvalidArgument("value is out of range".to_string()));
        }
        let key = key.as_ref();
        let _guard = self.locks.lock([key]);
        let picked = self.read_set_locked(key, |set| {
            let mut rng = rand::thread_rng();
            let n = count.unsigned_abs() as usize;
            if count >= 0 {
                set.random_distinct(&mut rng, n)
            } else {
                set.random_with_repetition(&mut rng, n)
            }
        })?;
        Ok(picked.unwrap_or_default())
    }

    pub fn sunion<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<Bytes>> {
        self.read_op(SetOp::Union, keys)
    }

    pub fn sinter<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<Bytes>> {
        self.read_op(SetOp::Intersect, keys)
    }

    pub fn sdiff<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<Bytes>> {
        self.read_op(SetOp::Difference, keys)
    }

    /// Cardinality of the intersection, stopping at `limit` when non-zero.
    pub fn sintercard<K: AsRef<[u8]>>(&self, keys: &[K], limit: usize) -> Result<usize> {
        require_keys("sintercard", keys)?;
        let _guard = self.locks.lock(keys);
        self.intercard_locked(keys, limit)
    }

    fn read_op<K: AsRef<[u8]>>(&self, op: SetOp, keys: &[K]) -> Result<Vec<Bytes>> {
        require_keys(op.name(), keys)?;
        let _guard = self.locks.lock(keys);
        Ok(self.compute_locked(op, keys)?.into_vec())
    }

    // ---- helpers; callers hold the key guard ----

    fn read_set_locked<R>(&self, key: &[u8], f: impl FnOnce(&SetValue) -> R) -> Result<Option<R>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(entry) => match entry.value().as_set() {
                Some(set) => Ok(Some(f(set))),
                None => Err(StoreError::WrongType),
            },
        }
    }

    /// Mutate an existing set, deleting the key if `f` leaves it empty.
    fn write_set_locked<R>(&self, key: &[u8], f: impl FnOnce(&mut SetValue) -> R) -> Result<Option<R>> {
        let Some(mut entry) = self.data.get_mut(key) else {
            return Ok(None);
        };
        let Value::Set(set) = entry.value_mut() else {
            return Err(StoreError::WrongType);
        };
        let result = f(set);
        let drained = set.is_empty();
        drop(entry);

        if drained {
            self.data.remove(key);
        }
        Ok(Some(result))
    }

    fn add_locked(&self, key: &[u8], members: impl Iterator<Item = Bytes>) -> Result<usize> {
        if let Some(mut entry) = self.data.get_mut(key) {
            let Value::Set(set) = entry.value_mut() else {
                return Err(StoreError::WrongType);
            };
            let mut added = 0;
            for member in members {
                if set.insert(member) {
                    added += 1;
                }
            }
            return Ok(added);
        }

        let set: SetValue = members.collect();
        let added = set.len();
        if added > 0 {
            self.data.insert(Bytes::copy_from_slice(key), Value::Set(set));
        }
        Ok(added)
    }

    fn store_locked(&self, key: &[u8], value: Value) {
        match value {
            Value::Set(set) if set.is_empty() => {
                self.data.remove(key);
            }
            value => {
                self.data.insert(Bytes::copy_from_slice(key), value);
            }
        }
    }

    /// Evaluate `op` over `keys`, absent keys acting as empty sets. Every key
    /// is type-checked even when the result is already known to be empty.
    fn compute_locked<K: AsRef<[u8]>>(&self, op: SetOp, keys: &[K]) -> Result<SetValue> {
        let mut sizes = Vec::with_capacity(keys.len());
        for key in keys {
            sizes.push(self.read_set_locked(key.as_ref(), SetValue::len)?);
        }

        match op {
            SetOp::Union => {
                let total: usize = sizes.iter().flatten().sum();
                let mut result = SetValue::with_capacity(total);
                for key in keys {
                    self.read_set_locked(key.as_ref(), |set| result.extend(set.iter().cloned()))?;
                }
                Ok(result)
            }
            SetOp::Intersect => {
                // Any absent key empties the intersection.
                let Some(sizes) = sizes.into_iter().collect::<Option<Vec<usize>>>() else {
                    return Ok(SetValue::new());
                };
                let smallest = (0..keys.len()).min_by_key(|&i| sizes[i]).unwrap_or(0);
                let mut result = self
                    .read_set_locked(keys[smallest].as_ref(), SetValue::clone)?
                    .unwrap_or_default();
                for (i, key) in keys.iter().enumerate() {
                    if i == smallest || result.is_empty() {
                        continue;
                    }
                    self.read_set_locked(key.as_ref(), |set| result.retain(|m| set.contains(m)))?;
                }
                Ok(result)
            }
            SetOp::Difference => {
                let mut result = self
                    .read_set_locked(keys[0].as_ref(), SetValue::clone)?
                    .unwrap_or_default();
                for key in &keys[1..] {
                    if result.is_empty() {
                        break;
                    }
                    self.read_set_locked(key.as_ref(), |set| {
                        if set.len() < result.len() {
                            for m in set.iter() {
                                result.remove(m);
                            }
                        } else {
                            result.retain(|m| !set.contains(m));
                        }
                    })?;
                }
                Ok(result)
            }
        }
    }

    /// Count the intersection without building it. Candidates from the
    /// smallest set are checked against the others a batch at a time, so a
    /// non-zero `limit` stops the scan once it is reached.
    fn intercard_locked<K: AsRef<[u8]>>(&self, keys: &[K], limit: usize) -> Result<usize> {
        let mut sizes = Vec::with_capacity(keys.len());
        for key in keys {
            sizes.push(self.read_set_locked(key.as_ref(), SetValue::len)?);
        }
        let Some(sizes) = sizes.into_iter().collect::<Option<Vec<usize>>>() else {
            return Ok(0);
        };

        let smallest = (0..keys.len()).min_by_key(|&i| sizes[i]).unwrap_or(0);
        let small: &[u8] = keys[smallest].as_ref();
        let mut others: Vec<&[u8]> = Vec::with_capacity(keys.len() - 1);
        for (i, key) in keys.iter().enumerate() {
            if i != smallest {
                others.push(key.as_ref());
            }
        }

        let mut found = 0;
        let mut offset = 0;
        while offset < sizes[smallest] {
            let mut batch = self
                .read_set_locked(small, |set| {
                    set.iter()
                        .skip(offset)
                        .take(INTERCARD_BATCH)
                        .cloned()
                        .collect::<Vec<_>>()
                })?
                .unwrap_or_default();
            offset += INTERCARD_BATCH;

            for key in &others {
                if batch.is_empty() {
                    break;
                }
                self.read_set_locked(key, |set| batch.retain(|m| set.contains(m)))?;
            }
            found += batch.len();
            if limit > 0 && found >= limit {
                return Ok(limit);
            }
        }
        Ok(found)
    }
}

impl Default for SetStore {
    fn default() -> Self {
        Self::new()
    }
}

fn require_keys<K>(command: &str, keys: &[K]) -> Result<()> {
    if keys.is_empty() {
        return Err(StoreError::InvalidArgument(format!(
            "'{}' requires at least one key",
            command
        )));
    }
    Ok(())
}

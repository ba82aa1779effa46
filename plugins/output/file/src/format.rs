use serde::Serialize;

use crate::error::FileOutputError;
use crate::zone::Zone;

/// Two-slot cache of rendered timestamps.
///
/// Records in one time-sliced batch mostly share a handful of timestamps, so
/// two slots catch nearly every repeat. Misses overwrite the slots in turn
/// (round-robin, not LRU). A slot is only used after an exact match on the
/// epoch value.
#[derive(Debug, Clone, Default)]
pub struct TimestampCache {
    slots: [Option<(i64, String)>; 2],
    next: usize,
}

impl TimestampCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, time: i64) -> Option<&str> {
        self.slot_of(time)
            .and_then(|i| self.slots[i].as_ref())
            .map(|(_, rendered)| rendered.as_str())
    }

    /// Cached rendering of `time`, rendering and storing it on a miss.
    ///
    /// Nothing is stored when `render` returns `None`.
    pub fn get_or_render(&mut self, time: i64, render: impl FnOnce(i64) -> Option<String>) -> Option<&str> {
        let idx = match self.slot_of(time) {
            Some(i) => i,
            None => {
                let rendered = render(time)?;
                let i = self.next;
                self.slots[i] = Some((time, rendered));
                self.next = 1 - i;
                i
            }
        };
        self.slots[idx].as_ref().map(|(_, rendered)| rendered.as_str())
    }

    fn slot_of(&self, time: i64) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Some((t, _)) if *t == time))
    }
}

// ════════════════════════════════════════════════════════════════
//  RecordFormatter
// ════════════════════════════════════════════════════════════════

/// Renders one record per line: `{iso8601}\t{tag}\t{json}\n`.
///
/// Output depends only on the inputs and the zone; the cache never changes
/// what is produced, only how often the timestamp is rendered.
#[derive(Debug, Clone)]
pub struct RecordFormatter {
    zone: Zone,
    cache: TimestampCache,
}

impl RecordFormatter {
    pub fn new(zone: Zone) -> Self {
        Self {
            zone,
            cache: TimestampCache::new(),
        }
    }

    pub fn format<T>(&mut self, tag: &str, time: i64, payload: &T) -> Result<String, FileOutputError>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(payload).map_err(|e| FileOutputError::Format {
            tag: tag.to_string(),
            detail: format!("json serialize: {e}"),
        })?;

        let zone = self.zone;
        let ts = self
            .cache
            .get_or_render(time, |t| zone.iso8601(t))
            .ok_or_else(|| FileOutputError::Format {
                tag: tag.to_string(),
                detail: format!("timestamp {time} is out of range"),
            })?;

        let mut line = String::with_capacity(ts.len() + tag.len() + json.len() + 3);
        line.push_str(ts);
        line.push('\t');
        line.push_str(tag);
        line.push('\t');
        line.push_str(&json);
        line.push('\n');
        Ok(line)
    }
}

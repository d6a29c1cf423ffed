/// Read-through caching over [`Cache`](crate::db::Cache).
///
/// Returns the cached value when present. Otherwise awaits `$fetch`, queues
/// the result for a background write with the given TTL and returns it.
/// A failed cache read is logged and treated as a miss, so an unavailable
/// Redis only costs the upstream call.
///
/// # Arguments
/// * `$cache`: cache exposing `get_from_cache` and `set_in_background`
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write
/// * `$ttl`: time-to-live in seconds
/// * `$fetch`: future producing an `AppResult<T>` on a miss
///
/// # Example
/// ```rust,ignore
/// let info: AnimeInfo = cached!(cache, CacheKey::AnimeInfo(id), 3600, self.call_api(id))?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $fetch:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(hit)) => Ok(hit),
            miss => {
                if let Err(e) = miss {
                    tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                }
                match $fetch.await {
                    Ok(value) => {
                        $cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }};
}

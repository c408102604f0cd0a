/// Read-through caching for an optional [`Cache`](crate::db::Cache).
///
/// With `Some(cache)`, returns the cached value for `$key` if present;
/// otherwise awaits `$block`, queues the computed value for a background write
/// and returns it. A failed cache read is logged and treated as a miss. With
/// `None`, simply awaits `$block`.
///
/// # Arguments
/// * `$cache`: an `Option<&Cache>`
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write
/// * `$ttl`: time-to-live for the stored value, in seconds
/// * `$block`: future producing `AppResult<T>` on a miss
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache {
            Some(cache) => match cache.get_from_cache(&$key).await {
                Ok(Some(cached)) => Ok(cached),
                lookup => {
                    if let Err(e) = lookup {
                        tracing::warn!(error = %e, key = %$key, "Cache read failed, bypassing cache");
                    }
                    let value = $block.await?;
                    cache.set_in_background(&$key, &value, $ttl);
                    Ok(value)
                }
            },
            None => $block.await,
        }
    }};
}

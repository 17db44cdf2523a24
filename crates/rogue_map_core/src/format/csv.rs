//! Comma-separated tile id grids
//!
//! Used twice: the `<data encoding="csv">` payload of a TMX layer (one flat
//! list of raw gids, `0` = empty) and Tiled's per-layer CSV export (one line
//! per row of tile ids local to the tileset, `-1` = empty).

/// Parse a flat CSV gid list, ignoring line breaks and a trailing comma
pub fn parse_gids(text: &str) -> Result<Vec<u32>, String> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<u32>()
                .map_err(|_| format!("'{token}' is not a tile id"))
        })
        .collect()
}

/// Parse a per-layer CSV export into rows of local ids
pub fn parse_local_ids(text: &str) -> Result<Vec<Vec<Option<u32>>>, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split(',')
                .map(str::trim)
                .map(|token| match token.parse::<i64>() {
                    Ok(-1) => Ok(None),
                    Ok(id) => u32::try_from(id)
                        .map(Some)
                        .map_err(|_| format!("'{token}' is not a tile id")),
                    Err(_) => Err(format!("'{token}' is not a tile id")),
                })
                .collect()
        })
        .collect()
}

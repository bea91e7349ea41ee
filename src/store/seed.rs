//! Seed SQL for the cameras table.
//!
//! Every roster camera gets a row up front with a zero embedding so the
//! workflow's upserts always merge into an existing row.

use crate::roster::RosterEntry;

pub const DEFAULT_EMBEDDING_DIMENSION: usize = 512;

/// Render `INSERT INTO <table> (camera_id, lat, lon, embedding) VALUES ...;`.
pub fn seed_sql(table: &str, entries: &[RosterEntry], dimension: usize) -> String {
    let zero_vector = format!("array_fill(0::float, ARRAY[{}])::vector", dimension);
    let values: Vec<String> = entries
        .iter()
        .map(|entry| {
            format!(
                "('{}', {}, {}, {})",
                entry.id.as_str().replace('\'', "''"),
                coordinate(entry.lat),
                coordinate(entry.lng),
                zero_vector
            )
        })
        .collect();

    format!(
        "INSERT INTO {} (camera_id, lat, lon, embedding)\nVALUES\n{}\n;",
        table,
        values.join(",\n")
    )
}

fn coordinate(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => "NULL".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CameraId;

    #[test]
    fn renders_rows_with_zero_vectors() {
        let entries = vec![
            RosterEntry {
                id: CameraId::new("a1"),
                lat: Some(40.75),
                lng: Some(-73.5),
            },
            RosterEntry {
                id: CameraId::new("o'hare"),
                lat: None,
                lng: None,
            },
        ];
        let sql = seed_sql("cameras", &entries, 4);
        assert_eq!(
            sql,
            "INSERT INTO cameras (camera_id, lat, lon, embedding)\nVALUES\n\
             ('a1', 40.75, -73.5, array_fill(0::float, ARRAY[4])::vector),\n\
             ('o''hare', NULL, NULL, array_fill(0::float, ARRAY[4])::vector)\n;"
        );
    }
}

//! hotel_bookings 表结构
//!
//! 列清单写进 sql_engine 工具描述供模型参考（仅建议，不强制），启动时也用它建表。

/// (列名, 类型)
pub const HOTEL_BOOKINGS_COLUMNS: &[(&str, &str)] = &[
    ("index", "INTEGER"),
    ("hotel", "TEXT"),
    ("is_canceled", "INTEGER"),
    ("lead_time", "INTEGER"),
    ("arrival_date_year", "INTEGER"),
    ("arrival_date_month", "TEXT"),
    ("arrival_date_week_number", "INTEGER"),
    ("arrival_date_day_of_month", "INTEGER"),
    ("stays_in_weekend_nights", "INTEGER"),
    ("stays_in_week_nights", "INTEGER"),
    ("adults", "INTEGER"),
    ("children", "REAL"),
    ("babies", "INTEGER"),
    ("meal", "TEXT"),
    ("country", "TEXT"),
    ("market_segment", "TEXT"),
    ("distribution_channel", "TEXT"),
    ("is_repeated_guest", "INTEGER"),
    ("previous_cancellations", "INTEGER"),
    ("previous_bookings_not_canceled", "INTEGER"),
    ("reserved_room_type", "TEXT"),
    ("assigned_room_type", "TEXT"),
    ("booking_changes", "INTEGER"),
    ("deposit_type", "TEXT"),
    ("agent", "REAL"),
    ("company", "REAL"),
    ("days_in_waiting_list", "INTEGER"),
    ("customer_type", "TEXT"),
    ("adr", "REAL"),
    ("required_car_parking_spaces", "INTEGER"),
    ("total_of_special_requests", "INTEGER"),
    ("reservation_status", "TEXT"),
    ("reservation_status_date", "TEXT"),
];

/// 表描述文本（拼入工具描述）
pub fn table_description(table: &str) -> String {
    let mut s = format!("The table is named '{}'. Its description is as follows:\n    Columns:\n", table);
    for (name, ty) in HOTEL_BOOKINGS_COLUMNS {
        s.push_str(&format!("    - {}: {}\n", name, ty));
    }
    s
}

/// CREATE TABLE IF NOT EXISTS 语句；`index` 是关键字，列名统一加双引号
pub fn create_table_sql(table: &str) -> String {
    let columns: Vec<String> = HOTEL_BOOKINGS_COLUMNS
        .iter()
        .map(|(name, ty)| format!("\"{}\" {}", name, ty))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
        table,
        columns.join(", ")
    )
}

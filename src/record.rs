use serde::Serialize;

/// Column names of the output file, in serialization order.
pub const HEADER: [&str; 7] = [
    "游戏名称",
    "国家",
    "发表时间",
    "作者",
    "游戏时长",
    "内容",
    "是否推荐/好评",
];

/// One review card, flattened. Field order matches [`HEADER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRecord {
    pub game_name: String,
    pub region: String,
    /// `YYYY-MM-DD` when the source date could be parsed.
    pub posted_at: String,
    pub author: String,
    /// One fractional digit, `"0.0"` when unknown.
    pub playtime_hours: String,
    pub body: String,
    pub recommended: String,
}

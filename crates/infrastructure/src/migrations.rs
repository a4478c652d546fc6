//! 数据库迁移。脚本在编译期打包进二进制，启动时执行。

use sqlx::migrate::Migrator;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

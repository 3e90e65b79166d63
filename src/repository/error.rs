// ==========================================
// 停电抢修调度系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: revision 冲突与记录缺失必须可区分,API 层据此决定重试或 404
// ==========================================

use rusqlite::ErrorCode;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 并发控制 =====
    /// 班组记录的 revision 已被其他写入推进
    #[error("班组写入冲突: crew_id={crew_id}, 期望revision={expected}, 实际revision={actual}")]
    OptimisticLockFailure {
        crew_id: String,
        expected: i32,
        actual: i32,
    },

    // ===== 数据库 =====
    #[error("记录不存在: {entity}(id={id})")]
    NotFound { entity: String, id: String },

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("连接锁不可用: {0}")]
    LockError(String),

    #[error("SQL执行失败: {0}")]
    DatabaseQueryError(String),

    #[error("主键/唯一约束冲突: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束冲突: {0}")]
    ForeignKeyViolation(String),

    // ===== 数据质量 =====
    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== 通用 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

// 按 SQLite 扩展错误码分类,不依赖错误消息文本
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, ref msg) => {
                let text = msg.clone().unwrap_or_else(|| failure.to_string());
                match failure.code {
                    ErrorCode::ConstraintViolation => match failure.extended_code {
                        rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                            RepositoryError::ForeignKeyViolation(text)
                        }
                        rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                            RepositoryError::UniqueConstraintViolation(text)
                        }
                        _ => RepositoryError::DatabaseQueryError(text),
                    },
                    ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::CannotOpen => RepositoryError::DatabaseConnectionError(text),
                    _ => RepositoryError::DatabaseQueryError(text),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::not_found("Unknown", "Unknown"),
            rusqlite::Error::FromSqlConversionFailure(idx, _, ref cause) => {
                RepositoryError::DatabaseQueryError(format!("第{}列数据无法解析: {}", idx, cause))
            }
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

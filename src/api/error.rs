// ==========================================
// 停电抢修调度系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/状态机错误为用户友好的错误消息
// ==========================================

use crate::engine::crew_state_machine::TransitionError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 事件缺少地理中心,无法派遣/推进
    #[error("事件缺少地理中心: event_id={event_id}")]
    InvalidGeometry { event_id: String },

    #[error("非法状态流转: status={from}, action={action}")]
    IllegalTransition { from: String, action: String },

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("并发写入冲突: {0}")]
    StoreConflict(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定的错误代码（对外契约）
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidGeometry { .. } => "INVALID_GEOMETRY",
            ApiError::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::StoreConflict(_) => "STORE_CONFLICT",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }

    /// 对应的 HTTP 状态码
    pub fn http_status(&self) -> u16 {
        match self {
            ApiError::InvalidInput(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::InvalidGeometry { .. } => 422,
            ApiError::IllegalTransition { .. } => 409,
            ApiError::BusinessRuleViolation(_) => 409,
            ApiError::StoreConflict(_) => 409,
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::InternalError(_)
            | ApiError::Other(_) => 500,
        }
    }

    /// 附加详情（可选）
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::InvalidGeometry { event_id } => {
                Some(serde_json::json!({ "event_id": event_id }))
            }
            ApiError::IllegalTransition { from, action } => {
                Some(serde_json::json!({ "from": from, "action": action }))
            }
            _ => None,
        }
    }

    /// 并发冲突可由调用方重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::StoreConflict(_))
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                crew_id,
                expected,
                actual,
            } => ApiError::StoreConflict(format!(
                "班组{}已被其他写入修改（期望revision={}，实际revision={}）",
                crew_id, expected, actual
            )),

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 TransitionError 转换
// ==========================================
impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::IllegalTransition { from, action } => ApiError::IllegalTransition {
                from: from.to_string(),
                action: action.to_string(),
            },
            TransitionError::NotOffDuty { .. } => {
                ApiError::BusinessRuleViolation(format!("{}，请使用普通派遣", err))
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

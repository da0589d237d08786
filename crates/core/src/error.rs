//! 에러 타입 -- 도메인별 에러 정의

/// Clearance 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ClearanceError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 패키지 모델 에러
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// 큐레이션 처리 에러
    #[error("curation error: {0}")]
    Curation(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 패키지 모델 에러
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// 패키지 식별자 형식 오류
    #[error("invalid package id '{id}': {reason}")]
    InvalidPackageId { id: String, reason: String },

    /// 모델 파일 파싱 실패
    #[error("failed to parse model {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    /// 모델 직렬화 실패
    #[error("failed to serialize model: {0}")]
    Serialize(String),
}

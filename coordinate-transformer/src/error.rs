use lidar_core::TransformError;
use proj_sys_transformer::ProjError;

pub(crate) fn transform_error(err: ProjError) -> TransformError {
    TransformError::Backend {
        code: err.code,
        message: err.message,
        context: err.context,
    }
}

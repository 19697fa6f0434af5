use std::{
    ffi::{CStr, CString},
    os::raw::c_char,
    path::Path,
    ptr,
};

use lidar_core::{Coord, EpsgCode};
use proj_sys as proj;

#[derive(Debug, thiserror::Error)]
#[error("PROJ error ({context}): {code} {message}")]
pub struct ProjError {
    pub code: i32,
    pub message: String,
    pub context: &'static str,
}

impl ProjError {
    fn new(message: impl Into<String>, context: &'static str) -> Self {
        Self {
            code: 0,
            message: message.into(),
            context,
        }
    }
}

/// Owns a PROJ context; destroyed after the transformation that uses it.
#[derive(Debug)]
struct Context(*mut proj::PJ_CONTEXT);

impl Context {
    fn create(data_dir: Option<&Path>) -> Result<Self, ProjError> {
        let ctx = unsafe { proj::proj_context_create() };
        if ctx.is_null() {
            return Err(ProjError::new(
                "proj_context_create() returned NULL",
                "proj_context_create",
            ));
        }
        let context = Self(ctx);

        // Grid files are fetched from the PROJ CDN on demand and cached locally.
        unsafe {
            proj::proj_context_set_enable_network(ctx, 1);
            proj::proj_grid_cache_set_enable(ctx, 1);
        }

        if let Some(dir) = data_dir {
            let c_path = c_string(&dir.to_string_lossy(), "proj_context_set_search_paths")?;
            let paths = [c_path.as_ptr()];
            unsafe {
                proj::proj_context_set_search_paths(ctx, paths.len() as i32, paths.as_ptr());
            }
        }

        Ok(context)
    }

    fn error(&self, context: &'static str) -> ProjError {
        let code = unsafe { proj::proj_context_errno(self.0) };
        ProjError {
            code,
            message: self.error_message(code),
            context,
        }
    }

    fn error_message(&self, code: i32) -> String {
        let c_msg = unsafe { proj::proj_context_errno_string(self.0, code) };
        if c_msg.is_null() {
            return "unknown error".to_string();
        }
        unsafe { CStr::from_ptr(c_msg as *const c_char) }
            .to_string_lossy()
            .into_owned()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { proj::proj_context_destroy(self.0) };
        }
    }
}

/// Transforms 2D coordinates between two CRSs with traditional GIS axis order
/// (easting/longitude first).
#[derive(Debug)]
pub struct ProjTransformer {
    pj: *mut proj::PJ,
    ctx: Context,
}

impl ProjTransformer {
    pub fn new_epsg(
        input_epsg: EpsgCode,
        output_epsg: EpsgCode,
        proj_data_dir: Option<&Path>,
    ) -> Result<Self, ProjError> {
        Self::new(
            &format!("EPSG:{input_epsg}"),
            &format!("EPSG:{output_epsg}"),
            proj_data_dir,
        )
    }

    pub fn new(
        source: &str,
        target: &str,
        proj_data_dir: Option<&Path>,
    ) -> Result<Self, ProjError> {
        let ctx = Context::create(proj_data_dir)?;
        let source = c_string(source, "proj_create_crs_to_crs")?;
        let target = c_string(target, "proj_create_crs_to_crs")?;

        let pj = unsafe {
            proj::proj_create_crs_to_crs(ctx.0, source.as_ptr(), target.as_ptr(), ptr::null_mut())
        };
        if pj.is_null() {
            return Err(ctx.error("proj_create_crs_to_crs"));
        }

        // EPSG:4326 and friends are lat,lon by definition; rings are always x,y.
        let normalized = unsafe { proj::proj_normalize_for_visualization(ctx.0, pj) };
        unsafe { proj::proj_destroy(pj) };
        if normalized.is_null() {
            return Err(ctx.error("proj_normalize_for_visualization"));
        }

        Ok(Self {
            pj: normalized,
            ctx,
        })
    }

    pub fn transform_coords_in_place(&mut self, coords: &mut [Coord]) -> Result<(), ProjError> {
        if coords.is_empty() {
            return Ok(());
        }

        let stride = std::mem::size_of::<Coord>();
        let n = coords.len();

        unsafe {
            proj::proj_errno_reset(self.pj);

            let first = coords.as_mut_ptr();
            let x = ptr::addr_of_mut!((*first).x);
            let y = ptr::addr_of_mut!((*first).y);

            proj::proj_trans_generic(
                self.pj,
                proj::PJ_DIRECTION_PJ_FWD,
                x,
                stride,
                n,
                y,
                stride,
                n,
                ptr::null_mut(),
                0,
                0,
                ptr::null_mut(),
                0,
                0,
            );

            let code = proj::proj_errno(self.pj);
            if code != 0 {
                return Err(ProjError {
                    code,
                    message: self.ctx.error_message(code),
                    context: "proj_trans_generic",
                });
            }
        }

        if let Some(index) = coords
            .iter()
            .position(|c| !c.x.is_finite() || !c.y.is_finite())
        {
            return Err(ProjError::new(
                format!("coordinate {index} could not be transformed"),
                "proj_trans_generic",
            ));
        }

        Ok(())
    }
}

impl Drop for ProjTransformer {
    fn drop(&mut self) {
        if !self.pj.is_null() {
            unsafe { proj::proj_destroy(self.pj) };
            self.pj = ptr::null_mut();
        }
    }
}

fn c_string(value: &str, context: &'static str) -> Result<CString, ProjError> {
    CString::new(value).map_err(|_| ProjError::new(format!("{value:?} contains NUL byte"), context))
}

//! FFI interface for C/C++ hosts
//!
//! Provides C-compatible entry points for field matching and job extraction.
//! Requests and results cross the boundary as JSON strings.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::config::AutofillConfig;
use crate::error::{AutofillError, Result};
use crate::extraction::{ExtractionPipeline, HttpLlmTransport, JobRecord, LlmFallback, PageContent};
use crate::fill::{FormFiller, PlannedFill};
use crate::matching::{CustomRuleSpec, MatchMode};
use crate::profile::Profile;
use crate::session::PageSession;

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via autofill_free_result
#[repr(C)]
pub struct AutofillResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if the call failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub profile: Profile,
    #[serde(default)]
    pub config: Option<AutofillConfig>,
    #[serde(default)]
    pub custom_rules: Vec<CustomRuleSpec>,
    #[serde(default)]
    pub mode: MatchMode,
    /// Build the semantic page model from the same HTML.
    #[serde(default)]
    pub semantic: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub fills: Vec<PlannedFill>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    pub url: String,
    #[serde(default)]
    pub config: Option<AutofillConfig>,
    #[serde(default)]
    pub llm_endpoint: Option<String>,
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default)]
    pub llm_model: Option<String>,
}

/// Match every form control in the HTML against the profile.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `request_json` - JSON-serialized MatchRequest (null-terminated)
///
/// # Returns
/// AutofillResultFFI with json_ptr set to a MatchResponse, or error_ptr set
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `request_json` must be a valid null-terminated C string
/// - Caller must free the result via `autofill_free_result`
#[no_mangle]
pub unsafe extern "C" fn autofill_match_fields(
    html_ptr: *const c_char,
    html_len: usize,
    request_json: *const c_char,
) -> AutofillResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(e) => return make_error_result(&e.to_string()),
    };
    let request: MatchRequest = match read_request(request_json) {
        Ok(r) => r,
        Err(e) => return make_error_result(&e.to_string()),
    };

    into_result(perform_match(&html, request))
}

/// Extract a job record from a posting page.
///
/// # Safety
/// Same as autofill_match_fields; `request_json` is an ExtractRequest
#[no_mangle]
pub unsafe extern "C" fn autofill_extract_job(
    html_ptr: *const c_char,
    html_len: usize,
    request_json: *const c_char,
) -> AutofillResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(e) => return make_error_result(&e.to_string()),
    };
    let request: ExtractRequest = match read_request(request_json) {
        Ok(r) => r,
        Err(e) => return make_error_result(&e.to_string()),
    };

    into_result(perform_extraction(html, request))
}

/// Free an AutofillResultFFI returned by any autofill_* function
///
/// # Safety
/// - `result` must have been returned by this library
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn autofill_free_result(result: AutofillResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn read_html(html_ptr: *const c_char, html_len: usize) -> Result<String> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok(String::new());
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice)
        .map(str::to_string)
        .map_err(|_| AutofillError::InvalidInput("Invalid UTF-8 in HTML content".into()))
}

unsafe fn read_request<T: for<'de> Deserialize<'de>>(request_json: *const c_char) -> Result<T> {
    if request_json.is_null() {
        return Err(AutofillError::InvalidInput("Request JSON is null".into()));
    }
    let request_str = CStr::from_ptr(request_json)
        .to_str()
        .map_err(|_| AutofillError::InvalidInput("Invalid UTF-8 in request JSON".into()))?;
    serde_json::from_str(request_str)
        .map_err(|e| AutofillError::InvalidInput(format!("Failed to parse request JSON: {}", e)))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AutofillError::Transport(format!("failed to start runtime: {}", e)))
}

fn perform_match(html: &str, request: MatchRequest) -> Result<MatchResponse> {
    let mut builder = PageSession::builder()
        .config(request.config.unwrap_or_default())
        .custom_rules(&request.custom_rules);
    if request.semantic {
        builder = builder.semantic(html);
    }
    let session = builder.build()?;

    let document = Html::parse_document(html);
    let doc = session.open_document(&document);
    let filler = FormFiller::new(&session, &request.profile).with_mode(request.mode);
    let fills = runtime()?.block_on(filler.plan(&doc));
    Ok(MatchResponse { fills })
}

fn perform_extraction(html: String, request: ExtractRequest) -> Result<JobRecord> {
    let config = request.config.unwrap_or_default();
    config.validate()?;

    let mut pipeline = ExtractionPipeline::new(config.clone());
    if let Some(endpoint) = request.llm_endpoint {
        let mut transport = HttpLlmTransport::new(endpoint);
        if let Some(key) = request.llm_api_key {
            transport = transport.with_api_key(key);
        }
        if let Some(model) = request.llm_model {
            transport = transport.with_model(model);
        }
        pipeline = pipeline.with_llm(LlmFallback::new(Box::new(transport), &config));
    }

    let page = PageContent::new(html, request.url);
    Ok(runtime()?.block_on(pipeline.extract(&page)))
}

fn into_result<T: Serialize>(result: Result<T>) -> AutofillResultFFI {
    let value = match result {
        Ok(v) => v,
        Err(e) => return make_error_result(&e.to_string()),
    };
    match serde_json::to_string(&value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => AutofillResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> AutofillResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    AutofillResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    unsafe fn call(
        f: unsafe extern "C" fn(*const c_char, usize, *const c_char) -> AutofillResultFFI,
        html: &str,
        request: &str,
    ) -> std::result::Result<Value, String> {
        let request = CString::new(request).unwrap();
        let result = f(html.as_ptr() as *const c_char, html.len(), request.as_ptr());
        let out = if result.error_ptr.is_null() {
            let json = CStr::from_ptr(result.json_ptr).to_str().unwrap();
            Ok(serde_json::from_str(json).unwrap())
        } else {
            Err(CStr::from_ptr(result.error_ptr).to_string_lossy().into_owned())
        };
        autofill_free_result(result);
        out
    }

    #[test]
    fn test_match_fields() {
        let html = r#"<form><div><input type="email" id="email" autocomplete="email"></div>
            <div><input id="phone_number" type="tel"></div></form>"#;
        let request = r#"{"profile": {"personal": {"email": "ada@example.com", "phone": "+44 20 7946 0000"}},
            "mode": "staged"}"#;
        let response = unsafe { call(autofill_match_fields, html, request) }.unwrap();
        let fills = response["fills"].as_array().unwrap();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0]["candidate"]["fieldType"], "email");
        assert_eq!(fills[0]["candidate"]["source"], "autocomplete");
        assert_eq!(fills[0]["value"]["text"], "ada@example.com");
        assert_eq!(fills[1]["candidate"]["fieldType"], "phone");
    }

    #[test]
    fn test_match_fields_rejects_bad_input() {
        let err = unsafe { call(autofill_match_fields, "<input>", "{not json") }.unwrap_err();
        assert!(err.contains("Failed to parse request JSON"));

        let err = unsafe { call(autofill_match_fields, "<input>", r#"{"profile": {}, "config": {"llmThreshold": 3}}"#) }
            .unwrap_err();
        assert!(err.contains("llmThreshold"));

        let result = unsafe { autofill_match_fields(ptr::null(), 0, ptr::null()) };
        assert!(result.json_ptr.is_null());
        assert!(!result.error_ptr.is_null());
        unsafe { autofill_free_result(result) };
    }

    #[test]
    fn test_invalid_utf8_html() {
        let bytes = [0xffu8, 0xfe];
        let request = CString::new(r#"{"url": "https://example.com"}"#).unwrap();
        let result = unsafe { autofill_extract_job(bytes.as_ptr() as *const c_char, bytes.len(), request.as_ptr()) };
        let err = unsafe { CStr::from_ptr(result.error_ptr) }.to_string_lossy().into_owned();
        assert!(err.contains("Invalid UTF-8"));
        unsafe { autofill_free_result(result) };
    }

    #[test]
    fn test_extract_job() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type": "JobPosting", "title": "Site Reliability Engineer",
             "hiringOrganization": "Initech", "jobLocationType": "TELECOMMUTE"}
            </script></head><body></body></html>"#;
        let record = unsafe {
            call(
                autofill_extract_job,
                html,
                r#"{"url": "https://boards.greenhouse.io/initech/jobs/1"}"#,
            )
        }
        .unwrap();
        assert_eq!(record["fields"]["position"]["value"], "Site Reliability Engineer");
        assert_eq!(record["fields"]["company"]["value"], "Initech");
        assert_eq!(record["fields"]["location"]["value"], "Remote");
        assert_eq!(record["platform"], "greenhouse");
        assert_eq!(record["usedLlm"], false);
    }
}

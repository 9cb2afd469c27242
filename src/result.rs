//! PLC client result codes
//!
//! Error codes reported by S7 communication clients, grouped by the layer
//! that raises them. `0` is success. The lookup in [`result_text`] is a
//! closed table: codes are resolved by an exhaustive match, never by
//! scanning constants at runtime. The text is the name of the constant in
//! this module, e.g. `"ERR_TCP_DATA_RECEIVE"`.

/// Operation completed successfully.
pub const RESULT_OK: i32 = 0;

/// Text returned for codes outside the table.
pub const UNKNOWN_RESULT: &str = "<unknown>";

// ============================================================================
// TCP layer
// ============================================================================

pub const ERR_TCP_SOCKET_CREATION: i32 = 0x0000_0001;
pub const ERR_TCP_CONNECTION_TIMEOUT: i32 = 0x0000_0002;
pub const ERR_TCP_CONNECTION_FAILED: i32 = 0x0000_0003;
pub const ERR_TCP_RECEIVE_TIMEOUT: i32 = 0x0000_0004;
pub const ERR_TCP_DATA_RECEIVE: i32 = 0x0000_0005;
pub const ERR_TCP_SEND_TIMEOUT: i32 = 0x0000_0006;
pub const ERR_TCP_DATA_SEND: i32 = 0x0000_0007;
pub const ERR_TCP_CONNECTION_RESET: i32 = 0x0000_0008;
pub const ERR_TCP_NOT_CONNECTED: i32 = 0x0000_0009;
pub const ERR_TCP_UNREACHABLE_HOST: i32 = 0x0000_2751;

// ============================================================================
// ISO-on-TCP layer
// ============================================================================

pub const ERR_ISO_CONNECT: i32 = 0x0001_0000;
pub const ERR_ISO_INVALID_PDU: i32 = 0x0003_0000;
pub const ERR_ISO_INVALID_DATA_SIZE: i32 = 0x0004_0000;

// ============================================================================
// Client layer
// ============================================================================

pub const ERR_CLI_NEGOTIATING_PDU: i32 = 0x0010_0000;
pub const ERR_CLI_INVALID_PARAMS: i32 = 0x0020_0000;
pub const ERR_CLI_JOB_PENDING: i32 = 0x0030_0000;
pub const ERR_CLI_TOO_MANY_ITEMS: i32 = 0x0040_0000;
pub const ERR_CLI_INVALID_WORD_LEN: i32 = 0x0050_0000;
pub const ERR_CLI_PARTIAL_DATA_WRITTEN: i32 = 0x0060_0000;
pub const ERR_CLI_SIZE_OVER_PDU: i32 = 0x0070_0000;
pub const ERR_CLI_INVALID_PLC_ANSWER: i32 = 0x0080_0000;
pub const ERR_CLI_ADDRESS_OUT_OF_RANGE: i32 = 0x0090_0000;
pub const ERR_CLI_INVALID_TRANSPORT_SIZE: i32 = 0x00A0_0000;
pub const ERR_CLI_WRITE_DATA_SIZE_MISMATCH: i32 = 0x00B0_0000;
pub const ERR_CLI_ITEM_NOT_AVAILABLE: i32 = 0x00C0_0000;
pub const ERR_CLI_INVALID_VALUE: i32 = 0x00D0_0000;
pub const ERR_CLI_CANNOT_START_PLC: i32 = 0x00E0_0000;
pub const ERR_CLI_ALREADY_RUN: i32 = 0x00F0_0000;
pub const ERR_CLI_CANNOT_STOP_PLC: i32 = 0x0100_0000;
pub const ERR_CLI_CANNOT_COPY_RAM_TO_ROM: i32 = 0x0110_0000;
pub const ERR_CLI_CANNOT_COMPRESS: i32 = 0x0120_0000;
pub const ERR_CLI_ALREADY_STOP: i32 = 0x0130_0000;
pub const ERR_CLI_FUN_NOT_AVAILABLE: i32 = 0x0140_0000;
pub const ERR_CLI_UPLOAD_SEQUENCE_FAILED: i32 = 0x0150_0000;
pub const ERR_CLI_INVALID_DATA_SIZE_RECVD: i32 = 0x0160_0000;
pub const ERR_CLI_INVALID_BLOCK_TYPE: i32 = 0x0170_0000;
pub const ERR_CLI_INVALID_BLOCK_NUMBER: i32 = 0x0180_0000;
pub const ERR_CLI_INVALID_BLOCK_SIZE: i32 = 0x0190_0000;
pub const ERR_CLI_NEED_PASSWORD: i32 = 0x01D0_0000;
pub const ERR_CLI_INVALID_PASSWORD: i32 = 0x01E0_0000;
pub const ERR_CLI_NO_PASSWORD_TO_SET_OR_CLEAR: i32 = 0x01F0_0000;
pub const ERR_CLI_JOB_TIMEOUT: i32 = 0x0200_0000;
pub const ERR_CLI_PARTIAL_DATA_READ: i32 = 0x0210_0000;
pub const ERR_CLI_BUFFER_TOO_SMALL: i32 = 0x0220_0000;
pub const ERR_CLI_FUNCTION_REFUSED: i32 = 0x0230_0000;
pub const ERR_CLI_DESTROYING: i32 = 0x0240_0000;
pub const ERR_CLI_INVALID_PARAM_NUMBER: i32 = 0x0250_0000;
pub const ERR_CLI_CANNOT_CHANGE_PARAM: i32 = 0x0260_0000;
pub const ERR_CLI_FUNCTION_NOT_IMPLEMENTED: i32 = 0x0270_0000;

/// Resolve a result code to its constant name.
///
/// Returns `"OK"` for `0` and [`UNKNOWN_RESULT`] for codes outside the table.
///
/// # Example
///
/// ```rust
/// use voltage_s7::result::{result_text, ERR_CLI_JOB_TIMEOUT, UNKNOWN_RESULT};
///
/// assert_eq!(result_text(ERR_CLI_JOB_TIMEOUT), "ERR_CLI_JOB_TIMEOUT");
/// assert_eq!(result_text(-1), UNKNOWN_RESULT);
/// ```
pub fn result_text(code: i32) -> &'static str {
    match code {
        RESULT_OK => "OK",
        ERR_TCP_SOCKET_CREATION => "ERR_TCP_SOCKET_CREATION",
        ERR_TCP_CONNECTION_TIMEOUT => "ERR_TCP_CONNECTION_TIMEOUT",
        ERR_TCP_CONNECTION_FAILED => "ERR_TCP_CONNECTION_FAILED",
        ERR_TCP_RECEIVE_TIMEOUT => "ERR_TCP_RECEIVE_TIMEOUT",
        ERR_TCP_DATA_RECEIVE => "ERR_TCP_DATA_RECEIVE",
        ERR_TCP_SEND_TIMEOUT => "ERR_TCP_SEND_TIMEOUT",
        ERR_TCP_DATA_SEND => "ERR_TCP_DATA_SEND",
        ERR_TCP_CONNECTION_RESET => "ERR_TCP_CONNECTION_RESET",
        ERR_TCP_NOT_CONNECTED => "ERR_TCP_NOT_CONNECTED",
        ERR_TCP_UNREACHABLE_HOST => "ERR_TCP_UNREACHABLE_HOST",
        ERR_ISO_CONNECT => "ERR_ISO_CONNECT",
        ERR_ISO_INVALID_PDU => "ERR_ISO_INVALID_PDU",
        ERR_ISO_INVALID_DATA_SIZE => "ERR_ISO_INVALID_DATA_SIZE",
        ERR_CLI_NEGOTIATING_PDU => "ERR_CLI_NEGOTIATING_PDU",
        ERR_CLI_INVALID_PARAMS => "ERR_CLI_INVALID_PARAMS",
        ERR_CLI_JOB_PENDING => "ERR_CLI_JOB_PENDING",
        ERR_CLI_TOO_MANY_ITEMS => "ERR_CLI_TOO_MANY_ITEMS",
        ERR_CLI_INVALID_WORD_LEN => "ERR_CLI_INVALID_WORD_LEN",
        ERR_CLI_PARTIAL_DATA_WRITTEN => "ERR_CLI_PARTIAL_DATA_WRITTEN",
        ERR_CLI_SIZE_OVER_PDU => "ERR_CLI_SIZE_OVER_PDU",
        ERR_CLI_INVALID_PLC_ANSWER => "ERR_CLI_INVALID_PLC_ANSWER",
        ERR_CLI_ADDRESS_OUT_OF_RANGE => "ERR_CLI_ADDRESS_OUT_OF_RANGE",
        ERR_CLI_INVALID_TRANSPORT_SIZE => "ERR_CLI_INVALID_TRANSPORT_SIZE",
        ERR_CLI_WRITE_DATA_SIZE_MISMATCH => "ERR_CLI_WRITE_DATA_SIZE_MISMATCH",
        ERR_CLI_ITEM_NOT_AVAILABLE => "ERR_CLI_ITEM_NOT_AVAILABLE",
        ERR_CLI_INVALID_VALUE => "ERR_CLI_INVALID_VALUE",
        ERR_CLI_CANNOT_START_PLC => "ERR_CLI_CANNOT_START_PLC",
        ERR_CLI_ALREADY_RUN => "ERR_CLI_ALREADY_RUN",
        ERR_CLI_CANNOT_STOP_PLC => "ERR_CLI_CANNOT_STOP_PLC",
        ERR_CLI_CANNOT_COPY_RAM_TO_ROM => "ERR_CLI_CANNOT_COPY_RAM_TO_ROM",
        ERR_CLI_CANNOT_COMPRESS => "ERR_CLI_CANNOT_COMPRESS",
        ERR_CLI_ALREADY_STOP => "ERR_CLI_ALREADY_STOP",
        ERR_CLI_FUN_NOT_AVAILABLE => "ERR_CLI_FUN_NOT_AVAILABLE",
        ERR_CLI_UPLOAD_SEQUENCE_FAILED => "ERR_CLI_UPLOAD_SEQUENCE_FAILED",
        ERR_CLI_INVALID_DATA_SIZE_RECVD => "ERR_CLI_INVALID_DATA_SIZE_RECVD",
        ERR_CLI_INVALID_BLOCK_TYPE => "ERR_CLI_INVALID_BLOCK_TYPE",
        ERR_CLI_INVALID_BLOCK_NUMBER => "ERR_CLI_INVALID_BLOCK_NUMBER",
        ERR_CLI_INVALID_BLOCK_SIZE => "ERR_CLI_INVALID_BLOCK_SIZE",
        ERR_CLI_NEED_PASSWORD => "ERR_CLI_NEED_PASSWORD",
        ERR_CLI_INVALID_PASSWORD => "ERR_CLI_INVALID_PASSWORD",
        ERR_CLI_NO_PASSWORD_TO_SET_OR_CLEAR => "ERR_CLI_NO_PASSWORD_TO_SET_OR_CLEAR",
        ERR_CLI_JOB_TIMEOUT => "ERR_CLI_JOB_TIMEOUT",
        ERR_CLI_PARTIAL_DATA_READ => "ERR_CLI_PARTIAL_DATA_READ",
        ERR_CLI_BUFFER_TOO_SMALL => "ERR_CLI_BUFFER_TOO_SMALL",
        ERR_CLI_FUNCTION_REFUSED => "ERR_CLI_FUNCTION_REFUSED",
        ERR_CLI_DESTROYING => "ERR_CLI_DESTROYING",
        ERR_CLI_INVALID_PARAM_NUMBER => "ERR_CLI_INVALID_PARAM_NUMBER",
        ERR_CLI_CANNOT_CHANGE_PARAM => "ERR_CLI_CANNOT_CHANGE_PARAM",
        ERR_CLI_FUNCTION_NOT_IMPLEMENTED => "ERR_CLI_FUNCTION_NOT_IMPLEMENTED",
        _ => UNKNOWN_RESULT,
    }
}

/// Whether a result code signals success.
#[inline]
pub fn is_ok(code: i32) -> bool {
    code == RESULT_OK
}

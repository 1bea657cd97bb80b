//! Wire-protocol constants: command/data tokens and server status codes.
//!
//! These are part of the wire contract and must match the server exactly.

// Command tokens.
pub const CT_CREATE_DATABASE: u32 = 0x6054_5A42;
pub const CT_CREATE_MEASUREMENT: u32 = 0xBB63_2CE1;
pub const CT_WRITE_POINTS: u32 = 0xEAF5_E003;
pub const CT_SELECT_POINTS_LIMIT: u32 = 0x7446_C560;
pub const CT_SELECT_POINTS_LAST: u32 = 0x76CF_2220;
pub const CT_DELETE_POINTS: u32 = 0xD908_2F2C;
pub const CT_GET_SCHEMA: u32 = 0x87E5_A959;
pub const CT_LIST_DATABASES: u32 = 0x2920_0D6D;
pub const CT_LIST_MEASUREMENTS: u32 = 0x0FEB_1399;
pub const CT_LIST_SERIES: u32 = 0x7B82_38D6;
pub const CT_ACTIVE_SERIES: u32 = 0xF3B5_093D;
pub const CT_COUNT_POINTS: u32 = 0x0E32_9B19;
pub const CT_SUM_POINTS: u32 = 0x9030_5A39;
pub const CT_NOP: u32 = 0x22CF_1296;
pub const CT_AUTHENTICATE: u32 = 0x0995_EBDA;

// Data tokens.
pub const DT_DATABASE: u32 = 0x3938_5A4F;
pub const DT_MEASUREMENT: u32 = 0xDC1F_48F3;
pub const DT_SERIES: u32 = 0x4E87_3749;
pub const DT_TYPED_FIELDS: u32 = 0x02AC_7330;
pub const DT_FIELD_LIST: u32 = 0xBB62_ACC3;
pub const DT_CHUNK: u32 = 0xE4E8_518F;
pub const DT_TIME_FIRST: u32 = 0x55BA_37B4;
pub const DT_TIME_LAST: u32 = 0xC4EE_45BA;
pub const DT_NLIMIT: u32 = 0xEEF2_BB02;
pub const DT_NLAST: u32 = 0xD74F_10A3;
pub const DT_END: u32 = 0x4E29_ADCC;
pub const DT_STATUS_CODE: u32 = 0x8C8C_07D9;
pub const DT_FIELD_TYPE: u32 = 0x7DB4_0C2A;
pub const DT_FIELD_NAME: u32 = 0x5C0D_45C1;
pub const DT_READY_FOR_CHUNK: u32 = 0x6000_531C;
pub const DT_NPOINTS: u32 = 0x5F46_9D08;
pub const DT_WINDOW_NS: u32 = 0x76F0_C374;
pub const DT_SUMS_CHUNK: u32 = 0x53FC_76FC;
pub const DT_USERNAME: u32 = 0x6E39_D1DE;
pub const DT_PASSWORD: u32 = 0x602E_5B01;

/// Default time-range/count bounds used when a caller doesn't narrow a query.
pub const DEFAULT_TIME_FIRST: u64 = 0;
pub const DEFAULT_TIME_LAST: u64 = u64::MAX;
pub const DEFAULT_N: u64 = u64::MAX;

/// Server status codes, non-zero values of the `i32` that follows
/// `DT_STATUS_CODE`. `0` means success and is not represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum StatusCode {
    InitIoError = -1,
    CreateDatabaseIoError = -2,
    CreateMeasurementIoError = -3,
    InvalidMeasurement = -4,
    InvalidSeries = -5,
    CorruptSchemaFile = -6,
    NoSuchField = -7,
    EndOfSelect = -8,
    IncorrectWriteChunkLen = -9,
    OutOfOrderTimestamps = -10,
    TimestampOverwriteMismatch = -11,
    FieldOverwriteMismatch = -12,
    BitmapOverwriteMismatch = -13,
    TailFileTooBig = -14,
    TailFileInvalidSize = -15,
    InvalidTimeLast = -16,
    NoSuchSeries = -17,
    NoSuchDatabase = -18,
    NoSuchMeasurement = -19,
    MeasurementExists = -20,
    UserExists = -21,
    NoSuchUser = -22,
    NotATsdbRoot = -23,
    DuplicateField = -24,
    TooManyFields = -25,
    InvalidConfigFile = -26,
    InvalidChunkSize = -27,
}

impl StatusCode {
    /// Map a raw `i32` status to its enumerated kind, if recognized.
    pub fn from_raw(code: i32) -> Option<Self> {
        use StatusCode::*;
        Some(match code {
            -1 => InitIoError,
            -2 => CreateDatabaseIoError,
            -3 => CreateMeasurementIoError,
            -4 => InvalidMeasurement,
            -5 => InvalidSeries,
            -6 => CorruptSchemaFile,
            -7 => NoSuchField,
            -8 => EndOfSelect,
            -9 => IncorrectWriteChunkLen,
            -10 => OutOfOrderTimestamps,
            -11 => TimestampOverwriteMismatch,
            -12 => FieldOverwriteMismatch,
            -13 => BitmapOverwriteMismatch,
            -14 => TailFileTooBig,
            -15 => TailFileInvalidSize,
            -16 => InvalidTimeLast,
            -17 => NoSuchSeries,
            -18 => NoSuchDatabase,
            -19 => NoSuchMeasurement,
            -20 => MeasurementExists,
            -21 => UserExists,
            -22 => NoSuchUser,
            -23 => NotATsdbRoot,
            -24 => DuplicateField,
            -25 => TooManyFields,
            -26 => InvalidConfigFile,
            -27 => InvalidChunkSize,
            _ => return None,
        })
    }
}

//===========================================================================//

macro_rules! decode_error {
    ($e:expr) => {
        return Err($crate::error::Error::Decode(($e).to_string()))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::error::Error::Decode(format!($fmt, $($arg)+)))
    };
}

macro_rules! invalid_crop {
    ($e:expr) => {
        return Err($crate::error::Error::InvalidCrop(($e).to_string()))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::error::Error::InvalidCrop(format!($fmt, $($arg)+)))
    };
}

macro_rules! invalid_entries {
    ($e:expr) => {
        return Err($crate::error::Error::InvalidEntries(($e).to_string()))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::error::Error::InvalidEntries(
            format!($fmt, $($arg)+)))
    };
}

macro_rules! malformed_ico {
    ($e:expr) => {
        return Err($crate::error::Error::MalformedIco(($e).to_string()))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::error::Error::MalformedIco(format!($fmt, $($arg)+)))
    };
}

macro_rules! encode_error {
    ($e:expr) => {
        return Err($crate::error::Error::Encode(($e).to_string()))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::error::Error::Encode(format!($fmt, $($arg)+)))
    };
}

//===========================================================================//

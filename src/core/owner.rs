//! Resolves the user name that owns a file.

use std::fs::Metadata;

/// Returns the owning user's name, or `None` where ownership cannot be resolved.
#[cfg(unix)]
pub fn file_owner(metadata: &Metadata) -> Option<String> {
    use std::os::unix::fs::MetadataExt;
    user_name(metadata.uid()).or_else(|| Some(metadata.uid().to_string()))
}

#[cfg(not(unix))]
pub fn file_owner(_metadata: &Metadata) -> Option<String> {
    None
}

#[cfg(unix)]
fn user_name(uid: u32) -> Option<String> {
    use std::ffi::CStr;
    use std::{mem, ptr};

    let mut buf = vec![0; 2048];
    let mut passwd = unsafe { mem::zeroed::<libc::passwd>() };
    let mut result = ptr::null_mut::<libc::passwd>();

    loop {
        let r = unsafe {
            libc::getpwuid_r(uid, &mut passwd, buf.as_mut_ptr(), buf.len(), &mut result)
        };

        if r != libc::ERANGE {
            break;
        }

        let newsize = buf.len().checked_mul(2)?;
        buf.resize(newsize, 0);
    }

    // No such user, or lookup failed.
    if result.is_null() || passwd.pw_name.is_null() {
        return None;
    }

    let name = unsafe { CStr::from_ptr(passwd.pw_name) };
    Some(name.to_string_lossy().into_owned())
}

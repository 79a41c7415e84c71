//! SharedMemoryRegion - POSIX shared memory wrapper.
//!
//! Provides a scoped abstraction over shm_open and mmap. The mapping is
//! released on drop on every exit path, and the creator unlinks the name.
//! All unsafe operations are encapsulated with bounds checking.

use std::ffi::CString;
use std::mem::MaybeUninit;
use std::ptr::NonNull;

use crate::error::SharedMemoryError;
use crate::types::{MAX_CAPACITY, MIN_CAPACITY};

/// Represents a mapped shared memory region.
///
/// This struct owns the mapped memory and will unmap it on drop.
/// The memory can be shared between processes using the same name.
pub struct SharedMemoryRegion {
    /// Name of the shared memory object.
    name: String,
    /// Pointer to the mapped memory.
    ptr: NonNull<u8>,
    /// Size of the mapped region in bytes.
    size: usize,
    /// File descriptor for the shared memory object.
    fd: i32,
    /// Whether this instance created the SHM (and should unlink on drop).
    is_owner: bool,
}

// SAFETY: SharedMemoryRegion owns its mapping; moving it to another thread is fine.
unsafe impl Send for SharedMemoryRegion {}

// SAFETY: The region hands out raw pointers only. Every access through them goes
// through an unsafe Mailbox method whose caller must serialize access.
unsafe impl Sync for SharedMemoryRegion {}

impl SharedMemoryRegion {
    /// Minimum size for a shared memory region.
    pub const MIN_SIZE: usize = MIN_CAPACITY;

    /// Maximum size for a shared memory region.
    pub const MAX_SIZE: usize = MAX_CAPACITY;

    /// Create a new shared memory region, failing if the name is taken.
    ///
    /// # Arguments
    /// * `name` - Name of the shared memory object (will be prefixed with /)
    /// * `size` - Size in bytes (must be between MIN_SIZE and MAX_SIZE)
    ///
    /// # Errors
    /// `AlreadyExists` if another owner holds the name, `CreateFailed` or
    /// `MapFailed` for everything else.
    pub fn create(name: &str, size: usize) -> Result<Self, SharedMemoryError> {
        Self::validate(name, size)?;
        let c_name = Self::c_name(name)?;

        // SAFETY: c_name is a valid CString, flags are valid POSIX flags
        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_RDWR | libc::O_EXCL,
                0o600,
            )
        };

        if fd < 0 {
            let errno = std::io::Error::last_os_error();
            if errno.raw_os_error() == Some(libc::EEXIST) {
                return Err(SharedMemoryError::AlreadyExists {
                    name: name.to_string(),
                });
            }
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                reason: format!("shm_open failed: {}", errno),
            });
        }

        // SAFETY: fd is a valid file descriptor
        let result = unsafe { libc::ftruncate(fd, size as libc::off_t) };
        if result < 0 {
            let errno = std::io::Error::last_os_error();
            unsafe { libc::close(fd) };
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                reason: format!("ftruncate failed: {}", errno),
            });
        }

        let ptr = match Self::map(fd, size) {
            Ok(ptr) => ptr,
            Err(e) => {
                unsafe { libc::close(fd) };
                unsafe { libc::shm_unlink(c_name.as_ptr()) };
                return Err(e);
            }
        };

        // Zero-initialize the memory
        // SAFETY: ptr is valid for size bytes
        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0, size);
        }

        tracing::debug!(name = %name, size = size, "Created shared memory region");

        Ok(Self {
            name: name.to_string(),
            ptr,
            size,
            fd,
            is_owner: true,
        })
    }

    /// Open an existing shared memory region.
    ///
    /// The existing object must be at least `size` bytes. The contents are
    /// left as they are; this instance never unlinks the name.
    pub fn open(name: &str, size: usize) -> Result<Self, SharedMemoryError> {
        Self::validate(name, size)?;
        let c_name = Self::c_name(name)?;

        // SAFETY: c_name is a valid CString
        let fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, 0) };

        if fd < 0 {
            return Err(SharedMemoryError::OpenFailed {
                name: name.to_string(),
                reason: format!("shm_open failed: {}", std::io::Error::last_os_error()),
            });
        }

        let mut stat = MaybeUninit::<libc::stat>::uninit();
        // SAFETY: fd is valid and stat points to writable storage
        if unsafe { libc::fstat(fd, stat.as_mut_ptr()) } < 0 {
            let errno = std::io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(SharedMemoryError::OpenFailed {
                name: name.to_string(),
                reason: format!("fstat failed: {}", errno),
            });
        }
        // SAFETY: fstat succeeded and initialized the struct
        let existing = unsafe { stat.assume_init() }.st_size as usize;
        if existing < size {
            unsafe { libc::close(fd) };
            return Err(SharedMemoryError::OpenFailed {
                name: name.to_string(),
                reason: format!("Region is {} bytes, expected at least {}", existing, size),
            });
        }

        let ptr = match Self::map(fd, size) {
            Ok(ptr) => ptr,
            Err(e) => {
                unsafe { libc::close(fd) };
                return Err(e);
            }
        };

        tracing::debug!(name = %name, size = size, "Opened shared memory region");

        Ok(Self {
            name: name.to_string(),
            ptr,
            size,
            fd,
            is_owner: false,
        })
    }

    /// Create the region, taking over the name if it is already linked.
    ///
    /// A name left behind by a process that never ran its destructor would
    /// otherwise hand the next run the old contents and no ownership. The
    /// stale object is unlinked and a fresh zeroed one is created in its
    /// place. Anyone still mapping the old object keeps their mapping but no
    /// longer shares memory with the new owner.
    pub fn create_or_replace(name: &str, size: usize) -> Result<Self, SharedMemoryError> {
        match Self::create(name, size) {
            Err(SharedMemoryError::AlreadyExists { .. }) => {
                tracing::warn!(name = %name, "Reclaiming stale shared memory region");
                Self::unlink(name)?;
                Self::create(name, size)
            }
            other => other,
        }
    }

    /// Remove `name` from the shared memory namespace.
    ///
    /// Existing mappings stay valid until they are unmapped. A name that is
    /// already gone is not an error.
    pub fn unlink(name: &str) -> Result<(), SharedMemoryError> {
        let c_name = Self::c_name(name)?;
        // SAFETY: c_name is a valid CString
        if unsafe { libc::shm_unlink(c_name.as_ptr()) } < 0 {
            let errno = std::io::Error::last_os_error();
            if errno.raw_os_error() != Some(libc::ENOENT) {
                return Err(SharedMemoryError::CreateFailed {
                    name: name.to_string(),
                    reason: format!("shm_unlink failed: {}", errno),
                });
            }
        }
        tracing::debug!(name = %name, "Unlinked shared memory name");
        Ok(())
    }

    fn validate(name: &str, size: usize) -> Result<(), SharedMemoryError> {
        if name.is_empty() {
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                reason: "Name cannot be empty".to_string(),
            });
        }
        if size < Self::MIN_SIZE {
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                reason: format!("Size {} is below minimum {}", size, Self::MIN_SIZE),
            });
        }
        if size > Self::MAX_SIZE {
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                reason: format!("Size {} exceeds maximum {}", size, Self::MAX_SIZE),
            });
        }
        Ok(())
    }

    fn c_name(name: &str) -> Result<CString, SharedMemoryError> {
        CString::new(format!("/{}", name)).map_err(|e| SharedMemoryError::CreateFailed {
            name: name.to_string(),
            reason: format!("Invalid name: {}", e),
        })
    }

    fn map(fd: i32, size: usize) -> Result<NonNull<u8>, SharedMemoryError> {
        // SAFETY: fd is valid, size is validated, offset 0 is valid
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(SharedMemoryError::MapFailed {
                reason: format!("mmap failed: {}", std::io::Error::last_os_error()),
            });
        }

        NonNull::new(ptr as *mut u8).ok_or_else(|| SharedMemoryError::MapFailed {
            reason: "mmap returned null".to_string(),
        })
    }

    /// Get the name of this shared memory region.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the size of this shared memory region.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether this instance created the object and will unlink it.
    pub fn is_owner(&self) -> bool {
        self.is_owner
    }

    /// Get a raw pointer to the shared memory.
    ///
    /// Caller must ensure proper synchronization when accessing the memory.
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for SharedMemoryRegion {
    fn drop(&mut self) {
        // SAFETY: ptr and size were set during creation
        let result = unsafe { libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.size) };
        if result < 0 {
            tracing::error!(
                name = %self.name,
                error = %std::io::Error::last_os_error(),
                "Failed to unmap shared memory"
            );
        }

        // SAFETY: fd was opened during creation
        unsafe { libc::close(self.fd) };

        if self.is_owner {
            if let Ok(c_name) = Self::c_name(&self.name) {
                // SAFETY: c_name is a valid CString
                unsafe { libc::shm_unlink(c_name.as_ptr()) };
                tracing::debug!(name = %self.name, "Unlinked shared memory region");
            }
        }
    }
}

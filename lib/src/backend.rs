//! The database implementations of file system administration.

pub(crate) mod db;

#[cfg(test)]
pub(crate) mod testlib {
    //! A library for common utilities used by the unit tests.

    use rand::Rng;
    use std::{env, fmt, fs, io::Write, path};

    /// Used to create a temporary directory and delete it as part of the function exit.
    #[derive(Debug)]
    pub(crate) struct TestFixture(path::PathBuf);
    impl TestFixture {
        /// Creates a test directory or panics if a unique directory cannot be created.
        pub(crate) fn create() -> Self {
            let tmpdir = env::temp_dir();
            let mut root_dir: Option<path::PathBuf> = None;
            // try to create a test directory 10 times
            for _ in 0..10 {
                let test_dir = tmpdir.join(format!("lmt_dir-{}", generate_random_string(15)));
                match test_dir.exists() {
                    true => eprintln!("Test directory '{}' exists...", test_dir.display()),
                    false => {
                        root_dir.replace(test_dir);
                        break;
                    }
                }
            }
            match root_dir {
                Some(root_dir) => match fs::create_dir(&root_dir) {
                    Ok(_) => Self(root_dir),
                    Err(e) => panic!("Error creating '{}': {}", root_dir.display(), e),
                },
                None => panic!("Tried 10 times to get a unique test directory name and failed..."),
            }
        }
        /// The test directory.
        pub(crate) fn root(&self) -> &path::Path {
            self.0.as_path()
        }
        /// The pathname of a file in the test directory.
        pub(crate) fn path(&self, filename: &str) -> path::PathBuf {
            self.0.join(filename)
        }
        /// Write a file into the test directory and return its pathname.
        pub(crate) fn create_content(&self, filename: &str, content: &str) -> path::PathBuf {
            let path = self.path(filename);
            let mut file = match fs::File::create(&path) {
                Ok(file) => file,
                Err(e) => panic!("Error creating '{}': {}", path.display(), e),
            };
            if let Err(e) = file.write_all(content.as_bytes()) {
                panic!("Error writing '{}' content: {}", path.display(), e);
            }
            path
        }
    }
    impl Drop for TestFixture {
        /// Clean up the temporary directory as best you can.
        fn drop(&mut self) {
            if let Err(e) = fs::remove_dir_all(&self.0) {
                eprintln!("Yikes... Error cleaning up test directory: {}", e);
            }
        }
    }
    impl fmt::Display for TestFixture {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0.display())
        }
    }

    pub(crate) fn generate_random_string(len: usize) -> String {
        let mut rand = rand::rng();
        const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        (0..len)
            .map(|_| {
                let idx = rand.random_range(0..CHARS.len());
                CHARS[idx] as char
            })
            .collect()
    }
}
